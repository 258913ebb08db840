//! A remote backed by a directory export of a project.
//!
//! The export lives under `projects/<project id>/` of a storage backend:
//!
//! ```text
//! projects/4f2a9c/project.json   project details and organisation
//! projects/4f2a9c/commits.json   the commit log
//! projects/4f2a9c/files.json     current descriptor of every file
//! projects/4f2a9c/folders.json   every folder and its children
//! ```
//!
//! Content locators are storage paths inside the same backend.

mod wire;

use self::wire::{CommitDoc, FileDoc, FolderDoc, ProjectDoc};
use crate::error::{ErrorKind, Result};
use crate::{ContentStream, Remote};
use async_trait::async_trait;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tracing::instrument;
use treesync_model::{CommitRecord, FileId, FileVersion, FolderDescriptor, FolderId, NodeRef, Project, ProjectId};
use treesync_storage::BackendHandle;
use treesync_storage::error::ErrorKind as StorageErrorKind;

/// Content is handed out in chunks of this size, like a network body would be.
const CHUNK_SIZE: usize = 64 * 1024;

pub struct MirrorRemote {
    name: String,
    storage: BackendHandle,
    project: ProjectId,
}

impl MirrorRemote {
    pub fn new(storage: BackendHandle, project: ProjectId) -> Self {
        Self { name: format!("mirror:{}", storage.name()), storage, project }
    }

    fn document(&self, file: &str) -> PathBuf {
        Path::new("projects").join(self.project.as_str()).join(file)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match self.storage.read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {
                Err(e).or_raise(|| ErrorKind::NotFound(path.display().to_string()))
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.document(file);
        let bytes = self.read(&path).await?;
        serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidData(path.display().to_string()))
    }
}

#[async_trait]
impl Remote for MirrorRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_project(&self) -> Result<Project> {
        let doc: ProjectDoc = self.load("project.json").await?;
        Ok(doc.into())
    }

    async fn fetch_file_descriptor(&self, id: FileId) -> Result<FileVersion> {
        let docs: Vec<FileDoc> = self.load("files.json").await?;
        match docs.into_iter().find(|doc| doc.id == id.0) {
            Some(doc) => doc.try_into(),
            None => exn::bail!(ErrorKind::NotFound(format!("file {id}"))),
        }
    }

    async fn fetch_folder_descriptor(&self, id: FolderId) -> Result<(FolderDescriptor, Vec<NodeRef>)> {
        let docs: Vec<FolderDoc> = self.load("folders.json").await?;
        match docs.into_iter().find(|doc| doc.id == id.0) {
            Some(doc) => doc.try_into(),
            None => exn::bail!(ErrorKind::NotFound(format!("folder {id}"))),
        }
    }

    #[instrument(skip(self), fields(remote = %self.name))]
    async fn fetch_commits_since(&self, since: UtcDateTime) -> Result<Vec<CommitRecord>> {
        let docs: Vec<CommitDoc> = self.load("commits.json").await?;
        let mut commits = docs
            .into_iter()
            .map(CommitRecord::try_from)
            .filter(|c| c.as_ref().map_or(true, |c| c.created_at >= since))
            .collect::<Result<Vec<_>>>()?;
        commits.sort_by_key(|c| c.created_at);
        tracing::debug!(count = commits.len(), "Loaded commits from mirror");
        Ok(commits)
    }

    async fn fetch_content(&self, locator: &str) -> Result<ContentStream> {
        let bytes = self.read(Path::new(locator)).await?;
        let chunks: Vec<Result<Vec<u8>>> = bytes.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::sync::Arc;
    use treesync_model::{ChangeKind, ResolvedNode};
    use treesync_storage::backend::MockBackend;

    const PROJECT: &str = r#"{
        "id": "4f2a9c",
        "name": "Rover",
        "description": "Six wheels",
        "root_folder_id": 1,
        "organisation": { "id": 9, "name": "Acme" }
    }"#;
    const FOLDERS: &str = r#"[
        { "id": 1, "name": "Rover", "updated_at": 1700000000,
          "children": [{ "id": 10, "kind": "file" }, { "id": 2, "kind": "folder" }] },
        { "id": 2, "name": "chassis", "path": "Rover", "updated_at": 1700000000, "children": [] }
    ]"#;
    const FILES: &str = r#"[
        { "id": 10, "filename": "notes.txt", "path": "Rover", "version": 2, "updated_at": 1700000100,
          "size": 5, "locators": { "1": "blobs/notes-1", "2": "blobs/notes-2" } }
    ]"#;
    const COMMITS: &str = r#"[
        { "id": 2, "name": "second", "message": "", "author": { "id": 1, "name": "Ada" }, "created_at": 1700000200,
          "changes": [{ "kind": "updated", "file": { "id": 10, "filename": "notes.txt", "path": "Rover",
                        "version": 2, "updated_at": 1700000100 } }] },
        { "id": 1, "name": "first", "author": { "id": 1, "name": "Ada" }, "created_at": 1700000000,
          "changes": [{ "kind": "added", "file": { "id": 10, "filename": "notes.txt", "path": "Rover",
                        "version": 1, "updated_at": 1700000000 } }] }
    ]"#;

    fn mirror() -> MirrorRemote {
        let big = vec![7u8; CHUNK_SIZE + 10];
        let backend = MockBackend::with_files([
            ("projects/4f2a9c/project.json", PROJECT.as_bytes().to_vec()),
            ("projects/4f2a9c/folders.json", FOLDERS.as_bytes().to_vec()),
            ("projects/4f2a9c/files.json", FILES.as_bytes().to_vec()),
            ("projects/4f2a9c/commits.json", COMMITS.as_bytes().to_vec()),
            ("blobs/notes-2", b"hello".to_vec()),
            ("blobs/big", big),
        ]);
        MirrorRemote::new(Arc::new(backend), ProjectId::new("4f2a9c"))
    }

    #[tokio::test]
    async fn test_fetch_project() {
        let project = mirror().fetch_project().await.unwrap();
        assert_eq!(project.name, "Rover");
        assert_eq!(project.root_folder_id, FolderId(1));
        assert_eq!(project.organisation.name, "Acme");
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let remote = MirrorRemote::new(Arc::new(MockBackend::default()), ProjectId::new("nope"));
        let err = remote.fetch_project().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_document_is_invalid_data() {
        let backend = MockBackend::with_files([("projects/x/project.json", b"{ not json".to_vec())]);
        let remote = MirrorRemote::new(Arc::new(backend), ProjectId::new("x"));
        let err = remote.fetch_project().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_fetch_nodes() {
        let remote = mirror();
        match remote.fetch_node(NodeRef::Folder(FolderId(1))).await.unwrap() {
            ResolvedNode::Folder(descriptor, children) => {
                assert_eq!(descriptor.name, "Rover");
                assert_eq!(children, vec![NodeRef::File(FileId(10)), NodeRef::Folder(FolderId(2))]);
            },
            ResolvedNode::File(_) => panic!("expected a folder"),
        }
        match remote.fetch_node(NodeRef::File(FileId(10))).await.unwrap() {
            ResolvedNode::File(file) => {
                assert_eq!(file.locator(), Some("blobs/notes-2"));
                assert_eq!(file.size, Some(5));
            },
            ResolvedNode::Folder(..) => panic!("expected a file"),
        }
        let err = remote.fetch_file_descriptor(FileId(99)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_commits_since_are_filtered_and_ordered() {
        let remote = mirror();
        let all = remote.fetch_commits_since(UtcDateTime::UNIX_EPOCH).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(all[1].changes[0].kind, ChangeKind::Updated);

        let since = UtcDateTime::from_unix_timestamp(1700000200).unwrap();
        let recent = remote.fetch_commits_since(since).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "second");
    }

    #[tokio::test]
    async fn test_content_is_chunked() {
        let remote = mirror();
        let chunks: Vec<Vec<u8>> = remote.fetch_content("blobs/big").await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), CHUNK_SIZE);
        assert_eq!(chunks[1].len(), 10);
        let err = remote.fetch_content("blobs/missing").await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
