//! Batched downloads from the remote into the working directory.

use crate::error::{ErrorKind, Result};
use crate::progress::ProgressTracker;
use exn::{OptionExt, ResultExt};
use futures::TryStreamExt;
use futures::future::join_all;
use tracing::instrument;
use treesync_model::{Digest, FileVersion};
use treesync_remote::Remote;
use treesync_storage::StorageBackend;

/// A file written to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub file: FileVersion,
    /// Digest of the bytes that were written.
    pub digest: Digest,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Batches started, including a failed last one.
    pub batches: usize,
    pub files: Vec<Downloaded>,
}

/// Download `files` in consecutive batches of at most `batch_size`.
///
/// Fetches within a batch run concurrently; the next batch starts only once
/// every fetch of the current one has finished. A failure does not cancel the
/// rest of its batch, but no further batch is started and the error is
/// returned as [`ErrorKind::Batch`] over the first failure.
#[instrument(skip_all, fields(files = files.len(), batch_size))]
pub async fn download(
    remote: &dyn Remote,
    backend: &dyn StorageBackend,
    files: &[FileVersion],
    batch_size: usize,
    tracker: &ProgressTracker,
) -> Result<TransferReport> {
    for file in files {
        tracker.register(file);
    }
    let mut report = TransferReport::default();
    for (group, batch) in files.chunks(batch_size.max(1)).enumerate() {
        report.batches += 1;
        tracing::debug!(group, files = batch.len(), "Starting download batch");
        let results = join_all(batch.iter().map(|file| fetch_one(remote, backend, file, tracker))).await;
        let total = results.len();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(downloaded) => report.files.push(downloaded),
                Err(err) => failures.push(err),
            }
        }
        let failed = failures.len();
        if let Some(first) = failures.into_iter().next() {
            tracing::warn!(group, failed, total, "Download batch failed");
            let retryable = first.is_retryable();
            return Err(first.raise(ErrorKind::Batch { failed, total, group, retryable }));
        }
    }
    Ok(report)
}

async fn fetch_one(
    remote: &dyn Remote,
    backend: &dyn StorageBackend,
    file: &FileVersion,
    tracker: &ProgressTracker,
) -> Result<Downloaded> {
    let locator = file.locator().ok_or_raise(|| ErrorKind::MissingLocator(file.id()))?;
    let mut content = remote.fetch_content(locator).await.or_raise(|| ErrorKind::Remote)?;
    let mut data = Vec::new();
    while let Some(chunk) = content.try_next().await.or_raise(|| ErrorKind::Remote)? {
        tracker.advance(file.id(), chunk.len() as u64);
        data.extend_from_slice(&chunk);
    }
    tracker.finish(file.id());

    let target = file.target_path();
    backend.write(&target, &data).await.or_raise(|| ErrorKind::Storage)?;
    tracing::info!(path = %target.display(), bytes = data.len(), "Downloaded");
    Ok(Downloaded { file: file.clone(), digest: Digest::of(&data), bytes: data.len() as u64 })
}
