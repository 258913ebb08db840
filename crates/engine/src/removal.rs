use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::PathBuf;
use treesync_model::FileVersion;
use treesync_storage::StorageBackend;

/// Remove deleted files from the working directory, then their directory if
/// that left it empty.
///
/// A file that is already gone, a directory that still holds other files and
/// a directory that no longer exists are all fine. Files living directly in
/// the working directory never cause the root to be removed. Returns the
/// paths of the files that were actually removed.
pub async fn remove_deleted(backend: &dyn StorageBackend, files: &[FileVersion]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for file in files {
        let target = file.target_path();
        match backend.delete(&target).await {
            Ok(()) => {
                tracing::info!(path = %target.display(), "Removed");
                removed.push(target.clone());
            },
            Err(err) if err.is_benign_for_removal() => {
                tracing::debug!(path = %target.display(), "Nothing to remove");
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Storage),
        }

        let dir = file.identity.relative_dir();
        if dir.as_os_str().is_empty() {
            continue;
        }
        match backend.remove_dir(&dir).await {
            Ok(()) => tracing::debug!(dir = %dir.display(), "Removed empty directory"),
            Err(err) if err.is_benign_for_removal() => {},
            Err(err) => return Err(err).or_raise(|| ErrorKind::Storage),
        }
    }
    Ok(removed)
}
