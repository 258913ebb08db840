//! Ledger Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A ledger error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ledger and state store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// Stored data could not be converted back into the model (or a model
    /// value does not fit the storage representation).
    #[display("invalid state data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// The working directory has never been bound to a project.
    #[display("repository is not initialized; run `init` first")]
    UninitializedRepository,
    /// No project or organisation is available where one is required.
    #[display("no active {_0} configured")]
    ConfigurationMissing(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
