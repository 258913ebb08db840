use crate::id::FileId;
use derive_more::Display;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// Content digest of a file's bytes (lowercase hex BLAKE3).
///
/// The empty digest stands in for "no such file" and never compares equal to
/// the digest of real content, not even of a zero-byte file.
#[derive(Debug, Display, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_string())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Digest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifies a remote file across its whole version history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub id: FileId,
    pub filename: String,
    /// Remote directory holding the file, starting with the project's root
    /// folder name (`Project/parts`).
    pub path: String,
}

impl FileIdentity {
    pub fn new(id: impl Into<FileId>, filename: impl Into<String>, path: impl Into<String>) -> Self {
        Self { id: id.into(), filename: filename.into(), path: path.into() }
    }

    /// Directory of the file relative to the working directory: the remote
    /// path without its leading root folder component.
    pub fn relative_dir(&self) -> PathBuf {
        self.path.split('/').filter(|c| !c.is_empty()).skip(1).collect()
    }

    /// Location of the file relative to the working directory.
    ///
    /// ```
    /// use treesync_model::FileIdentity;
    /// let file = FileIdentity::new(7, "bracket.step", "Rover/chassis/mounts");
    /// assert_eq!(file.target_path(), std::path::Path::new("chassis/mounts/bracket.step"));
    /// ```
    pub fn target_path(&self) -> PathBuf {
        self.relative_dir().join(&self.filename)
    }
}

/// One version of a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    pub identity: FileIdentity,
    pub version: u64,
    pub updated_at: UtcDateTime,
    /// Content-fetch locator for each known version number.
    pub locators: BTreeMap<u64, String>,
    /// Expected byte size, when the remote reports one.
    pub size: Option<u64>,
    /// Digest of the bytes written locally when this version was pulled.
    /// Always `None` on versions received from the remote.
    pub synced_digest: Option<Digest>,
}

impl FileVersion {
    pub fn new(identity: FileIdentity, version: u64, updated_at: UtcDateTime) -> Self {
        Self {
            identity,
            version,
            updated_at,
            locators: BTreeMap::new(),
            size: None,
            synced_digest: None,
        }
    }

    pub fn with_locator(mut self, version: u64, locator: impl Into<String>) -> Self {
        self.locators.insert(version, locator.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_synced_digest(mut self, digest: Digest) -> Self {
        self.synced_digest = Some(digest);
        self
    }

    pub fn id(&self) -> FileId {
        self.identity.id
    }

    pub fn filename(&self) -> &str {
        &self.identity.filename
    }

    pub fn target_path(&self) -> PathBuf {
        self.identity.target_path()
    }

    /// Locator for the content of this particular version.
    pub fn locator(&self) -> Option<&str> {
        self.locators.get(&self.version).map(String::as_str)
    }
}

/// What a file looks like on disk right now (or, for a baseline, what it
/// looked like right after it was last pulled).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalFileState {
    pub filename: String,
    /// Directory relative to the working directory.
    pub dir: PathBuf,
    pub digest: Digest,
    pub size: u64,
}

impl LocalFileState {
    /// Split a working-directory relative path into its directory and filename.
    pub fn from_path(path: &Path, digest: Digest, size: u64) -> Self {
        Self {
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            digest,
            size,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}
