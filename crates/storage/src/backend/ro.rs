//! Read-only decorator used for dry runs.
//!
//! Wraps another backend and turns every mutation into a logged no-op that
//! still reports success, so a dry-run pull walks exactly the same code path
//! as a real one.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, StorageBackend, backend::FileInfoStream, error::Result};

/// Read-only storage backend.
///
/// Silently drops all write operations, logging an
/// [`info event`](tracing::Event) for each.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        self.inner.list_stream(prefix)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(path = %path.display(), bytes = data.len(), "Dry run: would write file");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Dry run: would delete file");
        Ok(())
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Dry run: would remove directory if empty");
        Ok(())
    }
}
