//! The pull pipeline: bring the working directory up to date with a set of
//! remote commits.

use crate::aggregate::aggregate;
use crate::conflict::resolve;
use crate::digest::digest_tree;
use crate::divergence::{LocallyModified, locally_modified};
use crate::error::{ErrorKind, Result};
use crate::progress::{NullSink, ProgressPolicy, ProgressTracker, TracingSink};
use crate::removal::remove_deleted;
use crate::transfer::{Downloaded, download};
use crate::walk::{RemoteTree, walk_remote};
use exn::ResultExt;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::instrument;
use treesync_ledger::SyncLedger;
use treesync_model::{ChangeKind, CommitRecord, Digest, FileId, FileVersion, FolderId, LocalFileState};
use treesync_remote::RemoteHandle;
use treesync_storage::BackendHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct PullOptions {
    /// Overwrite local edits instead of holding remote updates back.
    pub force: bool,
    /// Suppress progress output.
    pub quiet: bool,
    /// Maximum number of concurrent remote requests per group.
    pub batch_size: usize,
    pub progress: ProgressPolicy,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self { force: false, quiet: false, batch_size: 8, progress: ProgressPolicy::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Working-directory paths of deleted files that were removed.
    pub removed: Vec<PathBuf>,
    pub downloaded: Vec<Downloaded>,
    /// Remote updates not applied because the local copy was edited.
    pub held_back: Vec<FileVersion>,
    /// Commits added to the ledger.
    pub appended: usize,
}

/// Connects a working directory to a remote.
pub struct Synchronizer {
    local: BackendHandle,
    remote: RemoteHandle,
    ignored: Vec<PathBuf>,
}

impl Synchronizer {
    pub fn new(local: BackendHandle, remote: RemoteHandle) -> Self {
        Self { local, remote, ignored: Vec::new() }
    }

    /// Working-directory paths that are never synchronized content, such as
    /// the state database and configuration files. SQLite's sidecar files
    /// next to an ignored path are skipped too.
    pub fn with_ignored(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.ignored.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    /// Files edited since they were last pulled.
    pub async fn local_changes(&self, ledger: &SyncLedger) -> Result<LocallyModified> {
        let disk = digest_tree(self.local.as_ref(), &self.ignored).await?;
        Ok(locally_modified(&disk, &baseline(ledger)))
    }

    pub async fn tree(&self, root: FolderId) -> Result<RemoteTree> {
        walk_remote(self.remote.as_ref(), root).await
    }

    /// Apply `commits` to the working directory and append them to `ledger`.
    ///
    /// With `force` set, files the ledger already holds but that were held
    /// back by an earlier pull are downloaded as well, even when `commits` is
    /// empty.
    ///
    /// The ledger is only touched once every removal and download succeeded;
    /// on error it is left exactly as it was.
    #[instrument(skip_all, fields(commits = commits.len(), force = options.force))]
    pub async fn pull(
        &self,
        ledger: &mut SyncLedger,
        mut commits: Vec<CommitRecord>,
        options: &PullOptions,
    ) -> Result<PullReport> {
        // Digest before anything is written.
        let disk = digest_tree(self.local.as_ref(), &self.ignored).await?;
        let baseline = baseline(ledger);
        let incoming = aggregate(&commits);
        tracing::debug!(fetch = incoming.to_fetch.len(), delete = incoming.to_delete.len(), "Aggregated commits");

        let mut wanted = incoming.to_fetch.clone();
        if options.force {
            let superseded: HashSet<FileId> =
                incoming.to_fetch.iter().chain(&incoming.to_delete).map(FileVersion::id).collect();
            let retried: Vec<FileVersion> =
                held_back(ledger).into_iter().filter(|file| !superseded.contains(&file.id())).collect();
            if !retried.is_empty() {
                tracing::debug!(files = retried.len(), "Retrying previously held back files");
            }
            wanted.extend(retried);
        }

        let removed = remove_deleted(self.local.as_ref(), &incoming.to_delete).await?;
        let descriptors = self.descriptors(&wanted, options.batch_size).await?;
        let modified = locally_modified(&disk, &baseline);
        let resolution = resolve(descriptors, &modified, options.force);

        let tracker = if options.quiet {
            ProgressTracker::new(options.progress, NullSink)
        } else {
            ProgressTracker::new(options.progress, TracingSink)
        };
        let transfer = download(
            self.remote.as_ref(),
            self.local.as_ref(),
            &resolution.download,
            options.batch_size,
            &tracker,
        )
        .await?;

        let digests: HashMap<FileId, &Digest> = transfer.files.iter().map(|d| (d.file.id(), &d.digest)).collect();
        for change in commits.iter_mut().flat_map(|commit| commit.changes.iter_mut()) {
            if change.kind == ChangeKind::Deleted {
                continue;
            }
            if let Some(digest) = digests.get(&change.file.id()) {
                change.file.synced_digest = Some((*digest).clone());
            }
        }
        let appended = ledger.append(commits);
        for downloaded in &transfer.files {
            ledger.mark_synced(downloaded.file.id(), &downloaded.digest);
        }
        tracing::info!(
            removed = removed.len(),
            downloaded = transfer.files.len(),
            held_back = resolution.held_back.len(),
            appended,
            "Pull complete"
        );
        Ok(PullReport { removed, downloaded: transfer.files, held_back: resolution.held_back, appended })
    }

    /// Full descriptors for every file, in barrier-separated groups.
    async fn descriptors(&self, files: &[FileVersion], batch_size: usize) -> Result<Vec<FileVersion>> {
        let mut descriptors = Vec::with_capacity(files.len());
        for batch in files.chunks(batch_size.max(1)) {
            let resolved = try_join_all(batch.iter().map(|file| self.remote.fetch_file_descriptor(file.id())))
                .await
                .or_raise(|| ErrorKind::Remote)?;
            descriptors.extend(resolved);
        }
        Ok(descriptors)
    }
}

/// Files the ledger records as pulled whose content was never written,
/// because a local edit held them back.
pub fn held_back(ledger: &SyncLedger) -> Vec<FileVersion> {
    aggregate(ledger.commits()).to_fetch.into_iter().filter(|file| file.synced_digest.is_none()).collect()
}

/// What the working directory looked like right after the ledger's commits
/// were pulled.
fn baseline(ledger: &SyncLedger) -> Vec<LocalFileState> {
    aggregate(ledger.commits())
        .to_fetch
        .into_iter()
        .map(|file| {
            let digest = file.synced_digest.clone().unwrap_or_else(Digest::empty);
            LocalFileState::from_path(&file.target_path(), digest, file.size.unwrap_or(0))
        })
        .collect()
}
