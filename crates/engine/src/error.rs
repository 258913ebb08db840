//! Engine Error Types
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Failures from the storage and remote crates are raised into one of the
//! kinds below, keeping the original error as a child in the tree.

use derive_more::{Display, Error};
use treesync_model::{FileId, FolderId};

/// An engine error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an engine failure.
///
/// ### Operational Errors
/// - [`ErrorKind::MissingLocator`]
/// - [`ErrorKind::NotAFolder`]
/// - [`ErrorKind::Batch`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Remote`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Reading, writing or listing the working directory failed.
    #[display("working directory operation failed")]
    Storage,
    /// A request to the remote failed.
    #[display("remote request failed")]
    Remote,
    /// The remote described a file version without saying where its content
    /// can be fetched from.
    #[display("no content locator for file {_0}")]
    MissingLocator(#[error(not(source))] FileId),
    /// The remote resolved a folder id to a file.
    #[display("remote node {_0} is not a folder")]
    NotAFolder(#[error(not(source))] FolderId),
    /// At least one operation of a concurrent group failed; the first failure
    /// is attached as the child error and decides `retryable`.
    #[display("{failed} of {total} operations failed in group {group}")]
    Batch { failed: usize, total: usize, group: usize, retryable: bool },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote => true,
            Self::Batch { retryable, .. } => *retryable,
            Self::Storage | Self::MissingLocator(_) | Self::NotAFolder(_) => false,
        }
    }
}
