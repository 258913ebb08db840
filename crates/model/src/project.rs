use crate::id::{FolderId, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organisation {
    pub id: u64,
    pub name: String,
}

/// The remote project a working directory is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// Folder the whole project tree hangs off; its name is the first
    /// component of every remote path in the project.
    pub root_folder_id: FolderId,
    pub organisation: Organisation,
}
