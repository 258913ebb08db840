//! CLI Error Types
//!
//! Library errors are raised into one of these kinds so that the printed
//! error tree starts with what the user was trying to do.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the working directory")]
    WorkingDirectory,
    #[display("could not read or write the sync state")]
    State,
    #[display("remote request failed")]
    Remote { retryable: bool },
    #[display("synchronization failed")]
    Sync { retryable: bool },
    #[display("invalid input")]
    InvalidInput,
    /// Nothing tells us where to pull from.
    #[display("no {_0} configured")]
    ConfigurationMissing(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { retryable } | Self::Sync { retryable } => *retryable,
            _ => false,
        }
    }
}

/// Raise a remote failure, keeping whether it is worth retrying.
pub fn remote(err: treesync_remote::error::Error) -> Error {
    let retryable = err.is_retryable();
    err.raise(ErrorKind::Remote { retryable })
}

/// Raise an engine failure, keeping whether it is worth retrying.
pub fn sync(err: treesync_engine::error::Error) -> Error {
    let retryable = err.is_retryable();
    err.raise(ErrorKind::Sync { retryable })
}
