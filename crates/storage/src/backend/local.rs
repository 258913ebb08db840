//! Local filesystem storage backend.
//!
//! Files live under a root directory (the working directory) and are accessed
//! through `tokio::fs`.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use treesync_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("workdir", "/home/me/projects/rover")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend rooted at `root`, creating the
    /// directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or points at something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Only happens once per invocation; not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        if !absolute.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!(
                "attempting to get relative path of non-absolute path `{:?}`",
                absolute
            )))
        }
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        Ok(validate_path(relative)?)
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(FileInfo::new(path, metadata.len(), UtcDateTime::from(modified)))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// One directory entry of the listing walk. Pulled out of the stream body
    /// so errors can be propagated with `?` and yielded in one place.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if metadata.is_dir() {
            // Descend into anything that could still contain matches: parents
            // of the prefix as well as directories underneath it.
            return Ok(match prefix {
                Some(pfx) if !relative.starts_with(pfx) && !pfx.starts_with(&relative) => WalkEntry::Skip,
                _ => WalkEntry::Descend(path),
            });
        }
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_file() {
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)?));
        }
        // Most likely a broken symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };
        let mut stack = vec![self.root.clone()];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // Listing a directory that vanished mid-walk (or never
                    // existed) yields nothing rather than an error.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("workdir", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("workdir", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("workdir", "relative/path").is_err());
        assert!(LocalBackend::new("workdir", "./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("checkout");
        LocalBackend::new("workdir", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("chassis/bracket.step");
        assert_eq!(backend.absolute_path("chassis/bracket.step").unwrap(), expected);
        assert_eq!(backend.relative_path(&expected).unwrap(), Path::new("chassis/bracket.step"));
        assert!(backend.absolute_path("../etc/passwd").is_err());
        assert!(backend.relative_path("/other/file.txt").is_err());
    }

    #[tokio::test]
    async fn test_write_overwrites_whole_file() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("a/b/notes.txt"), b"a much longer first draft").await.unwrap();
        backend.write(Path::new("a/b/notes.txt"), b"short").await.unwrap();
        assert_eq!(backend.read(Path::new("a/b/notes.txt")).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (_temp_dir, backend) = backend();
        let err = backend.read(Path::new("missing.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("file.txt"), b"data").await.unwrap();
        backend.delete(Path::new("file.txt")).await.unwrap();
        assert!(!backend.exists(Path::new("file.txt")).await.unwrap());
        let err = backend.delete(Path::new("file.txt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_dir() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("parts/a.txt"), b"a").await.unwrap();
        let err = backend.remove_dir(Path::new("parts")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DirectoryNotEmpty(_)));
        assert!(err.is_benign_for_removal());

        backend.delete(Path::new("parts/a.txt")).await.unwrap();
        backend.remove_dir(Path::new("parts")).await.unwrap();
        assert!(!temp_dir.path().join("parts").exists());

        let err = backend.remove_dir(Path::new("parts")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        // The root itself is never a valid target.
        assert!(backend.remove_dir(Path::new("")).await.is_err());
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("top.txt"), b"1").await.unwrap();
        backend.write(Path::new("chassis/mounts/bracket.step"), b"22").await.unwrap();
        std::fs::create_dir_all(_temp_dir.path().join("empty/dir")).unwrap();
        let mut paths: Vec<_> = backend.list(None).await.unwrap().into_iter().map(|f| (f.path, f.size)).collect();
        paths.sort();
        assert_eq!(paths, vec![(PathBuf::from("chassis/mounts/bracket.step"), 2), (PathBuf::from("top.txt"), 1)]);
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("chassis/sub/file.txt"), b"data").await.unwrap();
        backend.write(Path::new("chassis/subdir/file.txt"), b"data").await.unwrap();
        backend.write(Path::new("chassis/subfile.txt"), b"data").await.unwrap();
        let files = backend.list(Some(Path::new("chassis/sub"))).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("chassis/sub/file.txt"));
        assert!(backend.list(Some(Path::new("nonexistent"))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, backend) = backend();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../etc/passwd"), b"data").await.is_err());
        assert!(backend.delete(Path::new("../../file")).await.is_err());
        assert!(backend.remove_dir(Path::new("..")).await.is_err());
    }
}
