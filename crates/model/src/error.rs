//! Model Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, the same as every other treesync crate.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// User-supplied input (a project URL, a stored change kind) could not be
    /// interpreted.
    #[display("invalid input: {_0}")]
    InvalidInput(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
