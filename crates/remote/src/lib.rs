//! The remote side of a sync.
//!
//! The engine only ever sees the [`Remote`] trait: project details, file and
//! folder descriptors, the commit log and raw content, each fetched by id or
//! locator. How those requests reach the server (sessions, pagination,
//! parsing) is the implementation's business.
//!
//! Two implementations ship with the crate:
//! - [`MirrorRemote`] serves a project from a directory export reachable
//!   through any [`StorageBackend`](treesync_storage::StorageBackend).
//! - [`MockRemote`] (feature `mock`) is an in-memory remote instrumented for
//!   concurrency tests.

pub mod error;
mod mirror;
#[cfg(feature = "mock")]
mod mock;

pub use crate::mirror::MirrorRemote;
#[cfg(feature = "mock")]
pub use crate::mock::{MockEvent, MockRemote};
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use time::UtcDateTime;
use treesync_model::{CommitRecord, FileId, FileVersion, FolderDescriptor, FolderId, NodeRef, Project, ResolvedNode};

/// File content as it arrives, chunk by chunk.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

pub type RemoteHandle = Arc<dyn Remote>;

#[async_trait]
pub trait Remote: Send + Sync {
    /// Name of the remote, used for logging only.
    fn name(&self) -> &str;

    /// Details of the project this remote is bound to.
    async fn fetch_project(&self) -> Result<Project>;

    /// Full metadata (including content locators and size) of the current
    /// version of a file.
    async fn fetch_file_descriptor(&self, id: FileId) -> Result<FileVersion>;

    /// A folder's own metadata plus references to its direct children.
    async fn fetch_folder_descriptor(&self, id: FolderId) -> Result<(FolderDescriptor, Vec<NodeRef>)>;

    /// Every commit created at or after `since`, oldest first.
    async fn fetch_commits_since(&self, since: UtcDateTime) -> Result<Vec<CommitRecord>>;

    /// Stream the bytes behind a content locator.
    async fn fetch_content(&self, locator: &str) -> Result<ContentStream>;

    /// Resolve a child reference into either a file or a folder descriptor.
    async fn fetch_node(&self, node: NodeRef) -> Result<ResolvedNode> {
        match node {
            NodeRef::File(id) => self.fetch_file_descriptor(id).await.map(ResolvedNode::File),
            NodeRef::Folder(id) => {
                let (descriptor, children) = self.fetch_folder_descriptor(id).await?;
                Ok(ResolvedNode::Folder(descriptor, children))
            },
        }
    }
}
