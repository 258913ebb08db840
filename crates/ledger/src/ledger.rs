use std::collections::HashSet;
use treesync_model::{ChangeKind, CommitId, CommitRecord, Digest, FileId};

/// Commits on only one side of a local/remote comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDiff {
    /// Applied locally but unknown to the remote listing.
    pub local_only: Vec<CommitRecord>,
    /// Listed by the remote but not applied locally yet.
    pub remote_only: Vec<CommitRecord>,
}

/// Append-only record of the commits applied to the working directory.
///
/// Commit ids are unique within a ledger; [`append`](Self::append) skips
/// anything already recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncLedger {
    commits: Vec<CommitRecord>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The most recently appended commit.
    pub fn last_commit(&self) -> Option<&CommitRecord> {
        self.commits.last()
    }

    /// Split by commit id into what only we have and what only the remote
    /// has. Both sides keep the order of their respective inputs.
    pub fn diff(&self, remote: &[CommitRecord]) -> LedgerDiff {
        let local_ids: HashSet<CommitId> = self.commits.iter().map(|c| c.id).collect();
        let remote_ids: HashSet<CommitId> = remote.iter().map(|c| c.id).collect();
        LedgerDiff {
            local_only: self.commits.iter().filter(|c| !remote_ids.contains(&c.id)).cloned().collect(),
            remote_only: remote.iter().filter(|c| !local_ids.contains(&c.id)).cloned().collect(),
        }
    }

    /// Order the batch by creation time and add it to the end of the ledger.
    /// Entries already in the ledger are never re-sorted.
    ///
    /// Returns how many commits were actually appended: commits whose id is
    /// already recorded (or repeated within the batch) are skipped.
    pub fn append(&mut self, commits: impl IntoIterator<Item = CommitRecord>) -> usize {
        let mut batch: Vec<CommitRecord> = commits.into_iter().collect();
        batch.sort_by_key(|c| c.created_at);
        let mut known: HashSet<CommitId> = self.commits.iter().map(|c| c.id).collect();
        let before = self.commits.len();
        for commit in batch {
            if !known.insert(commit.id) {
                tracing::warn!(commit = %commit.id, "Skipping commit already present in the ledger");
                continue;
            }
            self.commits.push(commit);
        }
        self.commits.len() - before
    }

    /// Record that `digest` was written for `file`, on every recorded change
    /// of it that never got content on disk (because it was held back).
    ///
    /// Returns how many changes were stamped.
    pub fn mark_synced(&mut self, file: FileId, digest: &Digest) -> usize {
        let mut stamped = 0;
        for change in self.commits.iter_mut().flat_map(|commit| commit.changes.iter_mut()) {
            if change.kind == ChangeKind::Deleted || change.file.id() != file || change.file.synced_digest.is_some() {
                continue;
            }
            change.file.synced_digest = Some(digest.clone());
            stamped += 1;
        }
        stamped
    }
}

impl From<Vec<CommitRecord>> for SyncLedger {
    /// Rebuild a ledger from commits in their stored order.
    fn from(commits: Vec<CommitRecord>) -> Self {
        let mut ledger = Self::new();
        let mut known = HashSet::new();
        ledger.commits = commits.into_iter().filter(|c| known.insert(c.id)).collect();
        ledger
    }
}
