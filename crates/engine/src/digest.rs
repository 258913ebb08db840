//! Content digests of the working directory.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::{StreamExt, TryStreamExt, stream};
use std::path::{Path, PathBuf};
use tracing::instrument;
use treesync_model::{Digest, LocalFileState};
use treesync_storage::StorageBackend;
use treesync_storage::error::ErrorKind as StorageErrorKind;

/// How many files are read at once while digesting a tree.
const DIGEST_CONCURRENCY: usize = 16;

/// Files SQLite keeps next to a database while it is open.
const SQLITE_SIDECARS: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Digest a single file. A missing file yields the empty digest and a size of
/// zero rather than an error.
pub async fn digest_file(backend: &dyn StorageBackend, path: &Path) -> Result<LocalFileState> {
    match backend.read(path).await {
        Ok(data) => Ok(LocalFileState::from_path(path, Digest::of(&data), data.len() as u64)),
        Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => {
            tracing::debug!(path = %path.display(), "Digesting missing file");
            Ok(LocalFileState::from_path(path, Digest::empty(), 0))
        },
        Err(err) => Err(err).or_raise(|| ErrorKind::Storage),
    }
}

/// Digest every file of the working directory, sorted by path.
///
/// The `ignored` paths are skipped, as are SQLite's journal, WAL and
/// shared-memory files next to any of them.
#[instrument(skip_all, fields(backend = backend.name()))]
pub async fn digest_tree(backend: &dyn StorageBackend, ignored: &[PathBuf]) -> Result<Vec<LocalFileState>> {
    let files = backend.list(None).await.or_raise(|| ErrorKind::Storage)?;
    let paths: Vec<PathBuf> = files
        .into_iter()
        .map(|info| info.path)
        .filter(|path| !is_ignored(path, ignored))
        .collect();
    let mut digested: Vec<LocalFileState> = stream::iter(paths)
        .map(|path| async move { digest_file(backend, &path).await })
        .buffered(DIGEST_CONCURRENCY)
        .try_collect()
        .await?;
    digested.sort_by_key(LocalFileState::path);
    tracing::debug!(files = digested.len(), "Digested working directory");
    Ok(digested)
}

fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    let bytes = path.as_os_str().as_encoded_bytes();
    ignored.iter().any(|skip| {
        path == skip.as_path()
            || bytes
                .strip_prefix(skip.as_os_str().as_encoded_bytes())
                .is_some_and(|suffix| SQLITE_SIDECARS.iter().any(|sidecar| suffix == sidecar.as_bytes()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use treesync_storage::backend::{LocalBackend, MockBackend};

    #[tokio::test]
    async fn test_missing_file_has_empty_digest() {
        let backend = MockBackend::default();
        let state = digest_file(&backend, Path::new("parts/gone.step")).await.unwrap();
        assert!(state.digest.is_empty());
        assert_eq!(state.size, 0);
        assert_eq!(state.path(), Path::new("parts/gone.step"));
    }

    #[tokio::test]
    async fn test_digest_tree_skips_state_files() {
        let backend = MockBackend::with_files([
            ("b.txt", b"bee".as_slice()),
            ("parts/a.step", b"aye".as_slice()),
            (".treesync.db", b"state".as_slice()),
            (".treesync.db-journal", b"journal".as_slice()),
            (".treesync.db-wal", b"wal".as_slice()),
            (".treesync.db-shm", b"shm".as_slice()),
            ("treesync.toml", b"[transfer]".as_slice()),
        ]);
        let ignored = [PathBuf::from(".treesync.db"), PathBuf::from("treesync.toml")];
        let files = digest_tree(&backend, &ignored).await.unwrap();
        let paths: Vec<_> = files.iter().map(LocalFileState::path).collect();
        assert_eq!(paths, vec![PathBuf::from("b.txt"), PathBuf::from("parts/a.step")]);
        assert_eq!(files[1].digest, Digest::of(b"aye"));
        assert_eq!(files[1].size, 3);
    }

    #[tokio::test]
    async fn test_ignored_paths_match_exactly() {
        let backend = MockBackend::with_files([
            (".treesync.db", b"state".as_slice()),
            (".treesync.dbx", b"remote".as_slice()),
            (".treesync.db.bak", b"remote".as_slice()),
            (".treesync.db-journal/notes.txt", b"remote".as_slice()),
            ("parts/.treesync.db", b"remote".as_slice()),
        ]);
        let files = digest_tree(&backend, &[PathBuf::from(".treesync.db")]).await.unwrap();
        let paths: Vec<_> = files.iter().map(LocalFileState::path).collect();
        assert_eq!(paths, vec![
            PathBuf::from(".treesync.db-journal/notes.txt"),
            PathBuf::from(".treesync.db.bak"),
            PathBuf::from(".treesync.dbx"),
            PathBuf::from("parts/.treesync.db"),
        ]);
    }

    #[tokio::test]
    async fn test_digest_tree_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("chassis")).unwrap();
        std::fs::write(dir.path().join("chassis/frame.step"), b"frame").unwrap();
        let backend = LocalBackend::new("workdir", dir.path()).unwrap();
        let files = digest_tree(&backend, &[]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "frame.step");
        assert_eq!(files[0].dir, Path::new("chassis"));
        assert_eq!(files[0].digest, Digest::of(b"frame"));
    }
}
