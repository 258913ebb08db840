//! In-memory remote for testing.

use crate::error::{ErrorKind, Result};
use crate::{ContentStream, Remote};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use time::UtcDateTime;
use treesync_model::{
    CommitRecord, FileId, FileVersion, FolderDescriptor, FolderId, NodeRef, Organisation, Project, ProjectId,
};

/// Something the engine asked the mock remote for, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    FileDescriptor(FileId),
    FolderDescriptor(FolderId),
    ContentStarted(String),
    ContentFinished(String),
}

#[derive(Default)]
struct Activity {
    in_flight: usize,
    max_in_flight: usize,
    events: Vec<MockEvent>,
}

/// In-memory remote for testing.
///
/// Every request yields to the executor once while it is "in flight", so
/// requests issued together genuinely overlap and
/// [`max_in_flight`](Self::max_in_flight) reflects how many ran at once.
/// Requests for anything registered with [`fail`](Self::fail) or
/// [`fail_content`](Self::fail_content) error out.
pub struct MockRemote {
    project: Project,
    files: HashMap<FileId, FileVersion>,
    folders: HashMap<FolderId, (FolderDescriptor, Vec<NodeRef>)>,
    commits: Vec<CommitRecord>,
    content: HashMap<String, Vec<u8>>,
    chunk_size: usize,
    failing_nodes: HashSet<NodeRef>,
    failing_content: HashSet<String>,
    activity: Mutex<Activity>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self {
            project: Project {
                id: ProjectId::new("mock"),
                name: "Mock".to_string(),
                description: String::new(),
                root_folder_id: FolderId(1),
                organisation: Organisation { id: 1, name: "Mock Org".to_string() },
            },
            files: HashMap::new(),
            folders: HashMap::new(),
            commits: Vec::new(),
            content: HashMap::new(),
            chunk_size: 4,
            failing_nodes: HashSet::new(),
            failing_content: HashSet::new(),
            activity: Mutex::new(Activity::default()),
        }
    }
}

impl MockRemote {
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = project;
        self
    }

    pub fn with_file(mut self, file: FileVersion) -> Self {
        self.files.insert(file.id(), file);
        self
    }

    pub fn with_folder(mut self, descriptor: FolderDescriptor, children: Vec<NodeRef>) -> Self {
        self.folders.insert(descriptor.id, (descriptor, children));
        self
    }

    pub fn with_commit(mut self, commit: CommitRecord) -> Self {
        self.commits.push(commit);
        self
    }

    pub fn with_content(mut self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.content.insert(locator.into(), bytes.into());
        self
    }

    pub fn fail(mut self, node: NodeRef) -> Self {
        self.failing_nodes.insert(node);
        self
    }

    pub fn fail_content(mut self, locator: impl Into<String>) -> Self {
        self.failing_content.insert(locator.into());
        self
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.activity.lock().max_in_flight
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.activity.lock().events.clone()
    }

    async fn enter(&self, event: MockEvent) {
        {
            let mut activity = self.activity.lock();
            activity.in_flight += 1;
            activity.max_in_flight = activity.max_in_flight.max(activity.in_flight);
            activity.events.push(event);
        }
        tokio::task::yield_now().await;
    }

    fn leave(&self, event: Option<MockEvent>) {
        let mut activity = self.activity.lock();
        activity.in_flight -= 1;
        if let Some(event) = event {
            activity.events.push(event);
        }
    }
}

#[async_trait]
impl Remote for MockRemote {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_project(&self) -> Result<Project> {
        Ok(self.project.clone())
    }

    async fn fetch_file_descriptor(&self, id: FileId) -> Result<FileVersion> {
        self.enter(MockEvent::FileDescriptor(id)).await;
        self.leave(None);
        if self.failing_nodes.contains(&NodeRef::File(id)) {
            exn::bail!(ErrorKind::InvalidData(format!("injected failure for file {id}")));
        }
        self.files.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("file {id}"))))
    }

    async fn fetch_folder_descriptor(&self, id: FolderId) -> Result<(FolderDescriptor, Vec<NodeRef>)> {
        self.enter(MockEvent::FolderDescriptor(id)).await;
        self.leave(None);
        if self.failing_nodes.contains(&NodeRef::Folder(id)) {
            exn::bail!(ErrorKind::InvalidData(format!("injected failure for folder {id}")));
        }
        self.folders.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("folder {id}"))))
    }

    async fn fetch_commits_since(&self, since: UtcDateTime) -> Result<Vec<CommitRecord>> {
        let mut commits: Vec<_> = self.commits.iter().filter(|c| c.created_at >= since).cloned().collect();
        commits.sort_by_key(|c| c.created_at);
        Ok(commits)
    }

    async fn fetch_content(&self, locator: &str) -> Result<ContentStream> {
        self.enter(MockEvent::ContentStarted(locator.to_string())).await;
        self.leave(Some(MockEvent::ContentFinished(locator.to_string())));
        if self.failing_content.contains(locator) {
            exn::bail!(ErrorKind::InvalidData(format!("injected failure for {locator}")));
        }
        let bytes = self.content.get(locator).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(locator.to_string())))?;
        let chunks: Vec<Result<Vec<u8>>> = bytes.chunks(self.chunk_size).map(|c| Ok(c.to_vec())).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
