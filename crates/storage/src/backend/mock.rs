//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use crate::{FileInfo, StorageBackend};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

#[derive(Default)]
struct Contents {
    files: BTreeMap<PathBuf, (UtcDateTime, Vec<u8>)>,
    /// Directories created explicitly or implied by a write. Removed only by
    /// [`remove_dir`](StorageBackend::remove_dir).
    dirs: BTreeSet<PathBuf>,
}

impl Contents {
    fn insert(&mut self, path: PathBuf, data: Vec<u8>) {
        let mut parent = path.parent();
        while let Some(dir) = parent.filter(|p| !p.as_os_str().is_empty()) {
            self.dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }
        self.files.insert(path, (UtcDateTime::now(), data));
    }
}

/// In-memory storage backend for testing.
///
/// Behaves like a filesystem as far as the engine can tell: writes create
/// parent directories, and directories outlive the files inside them until
/// they are removed explicitly.
///
/// # Examples
///
/// ```
/// use treesync_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("chassis/bracket.step", b"solid")]);
/// assert!(backend.exists(Path::new("chassis/bracket.step")).await?);
/// backend.delete(Path::new("chassis/bracket.step")).await?;
/// backend.remove_dir(Path::new("chassis")).await?;
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    contents: RwLock<Contents>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut contents = Contents::default();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            contents.insert(validated, data.into());
        }
        Self { name: "mock".to_string(), contents: RwLock::new(contents) }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether a directory is currently known to the backend.
    pub async fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.contents.read().await.dirs.contains(path.as_ref())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let entries: Vec<FileInfo> = {
                let guard = self.contents.read().await;
                guard
                    .files
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, (modified, data))| FileInfo::new(path.clone(), data.len() as u64, *modified))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.contents.read().await.files.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.contents.read().await;
        let Some((_modified, data)) = guard.files.get(&path) else {
            exn::bail!(ErrorKind::NotFound(path));
        };
        Ok(data.clone())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.contents.write().await.insert(path, data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        match self.contents.write().await.files.remove(&path) {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        let mut guard = self.contents.write().await;
        if !guard.dirs.contains(&path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        let occupied = guard.files.keys().any(|f| f.starts_with(&path) && f != &path)
            || guard.dirs.iter().any(|d| d.starts_with(&path) && d != &path);
        if occupied {
            exn::bail!(ErrorKind::DirectoryNotEmpty(path));
        }
        guard.dirs.remove(&path);
        Ok(())
    }
}
