//! Storage backends for the local working directory.
//!
//! The engine never touches the filesystem directly: listing, digesting,
//! writing pulled files and cleaning up deleted ones all go through a
//! [`StorageBackend`], which keeps every path relative to (and inside) the
//! working directory and lets tests swap in an in-memory backend.

pub mod backend;
pub mod error;
mod file;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
