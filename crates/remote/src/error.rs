//! Remote Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A remote error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// ### Transport Errors
/// - [`ErrorKind::AuthenticationFailure`]
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::InvalidData`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The remote refused our credentials. Never retried.
    #[display("authentication failed")]
    AuthenticationFailure,
    /// The requested project, file, folder or content does not exist remotely.
    #[display("not found on remote: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The remote answered with something we could not make sense of.
    #[display("invalid remote data: {_0}")]
    InvalidData(#[error(not(source))] String),
    /// Reading from the storage backing the remote failed.
    #[display("remote storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
