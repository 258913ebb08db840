//! JSON documents of a project export and their conversion into model types.
//!
//! Timestamps are Unix seconds. Map keys of `locators` are version numbers.

use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use serde::Deserialize;
use std::collections::BTreeMap;
use time::UtcDateTime;
use treesync_model::{
    Author, Change, ChangeKind, CommitId, CommitRecord, FileIdentity, FileVersion, FolderDescriptor, FolderId,
    NodeRef, Organisation, Project, ProjectId,
};

fn timestamp(value: i64) -> Result<UtcDateTime, Error> {
    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(format!("timestamp {value}")))
}

#[derive(Deserialize)]
pub(super) struct ProjectDoc {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    root_folder_id: u64,
    organisation: OrganisationDoc,
}

#[derive(Deserialize)]
struct OrganisationDoc {
    id: u64,
    name: String,
}

impl From<ProjectDoc> for Project {
    fn from(doc: ProjectDoc) -> Self {
        Self {
            id: ProjectId::new(doc.id),
            name: doc.name,
            description: doc.description,
            root_folder_id: FolderId(doc.root_folder_id),
            organisation: Organisation { id: doc.organisation.id, name: doc.organisation.name },
        }
    }
}

#[derive(Deserialize)]
pub(super) struct FileDoc {
    pub(super) id: u64,
    filename: String,
    path: String,
    version: u64,
    updated_at: i64,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    locators: BTreeMap<u64, String>,
}

impl TryFrom<FileDoc> for FileVersion {
    type Error = Error;
    fn try_from(doc: FileDoc) -> Result<Self, Self::Error> {
        let identity = FileIdentity::new(doc.id, doc.filename, doc.path);
        let mut file = FileVersion::new(identity, doc.version, timestamp(doc.updated_at)?);
        file.locators = doc.locators;
        file.size = doc.size;
        Ok(file)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChildKind {
    File,
    Folder,
}

#[derive(Deserialize)]
struct ChildDoc {
    id: u64,
    kind: ChildKind,
}

#[derive(Deserialize)]
pub(super) struct FolderDoc {
    pub(super) id: u64,
    name: String,
    #[serde(default)]
    path: String,
    updated_at: i64,
    #[serde(default)]
    children: Vec<ChildDoc>,
}

impl TryFrom<FolderDoc> for (FolderDescriptor, Vec<NodeRef>) {
    type Error = Error;
    fn try_from(doc: FolderDoc) -> Result<Self, Self::Error> {
        let descriptor = FolderDescriptor {
            id: FolderId(doc.id),
            name: doc.name,
            path: doc.path,
            updated_at: timestamp(doc.updated_at)?,
        };
        let children = doc
            .children
            .into_iter()
            .map(|child| match child.kind {
                ChildKind::File => NodeRef::File(child.id.into()),
                ChildKind::Folder => NodeRef::Folder(child.id.into()),
            })
            .collect();
        Ok((descriptor, children))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindDoc {
    Added,
    Updated,
    Deleted,
}

#[derive(Deserialize)]
struct ChangeDoc {
    kind: KindDoc,
    file: FileDoc,
}

#[derive(Deserialize)]
struct AuthorDoc {
    id: u64,
    name: String,
}

#[derive(Deserialize)]
pub(super) struct CommitDoc {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
    author: AuthorDoc,
    created_at: i64,
    #[serde(default)]
    changes: Vec<ChangeDoc>,
}

impl TryFrom<CommitDoc> for CommitRecord {
    type Error = Error;
    fn try_from(doc: CommitDoc) -> Result<Self, Self::Error> {
        let changes = doc
            .changes
            .into_iter()
            .map(|change| {
                let kind = match change.kind {
                    KindDoc::Added => ChangeKind::Added,
                    KindDoc::Updated => ChangeKind::Updated,
                    KindDoc::Deleted => ChangeKind::Deleted,
                };
                Ok(Change::new(FileVersion::try_from(change.file)?, kind))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            id: CommitId(doc.id),
            name: doc.name,
            message: doc.message,
            author: Author { id: doc.author.id, name: doc.author.name },
            created_at: timestamp(doc.created_at)?,
            changes,
        })
    }
}
