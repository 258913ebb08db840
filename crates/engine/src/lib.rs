//! Reconciliation and transfer engine.
//!
//! A pull is a short pipeline over a handful of independent pieces, each of
//! which can also be used on its own:
//!
//! - [`aggregate`] folds commits into the latest change per file,
//! - [`locally_modified`] compares the working directory against the last
//!   synchronized state by content digest,
//! - [`resolve`] holds back remote updates that would clobber local edits,
//! - [`walk`] discovers the remote folder tree level by level,
//! - [`download`] fetches files in barrier-separated batches, reporting to a
//!   [`ProgressTracker`].
//!
//! [`Synchronizer::pull`] composes them. Concurrency never spawns tasks:
//! every group of requests is joined in place before the next one starts.

mod aggregate;
mod conflict;
mod digest;
mod divergence;
pub mod error;
pub mod progress;
mod pull;
mod removal;
mod transfer;
mod walk;

pub use crate::aggregate::{Aggregate, aggregate};
pub use crate::conflict::{Resolution, resolve};
pub use crate::digest::{digest_file, digest_tree};
pub use crate::divergence::{LocallyModified, locally_modified};
pub use crate::progress::{ProgressPolicy, ProgressTracker};
pub use crate::pull::{PullOptions, PullReport, Synchronizer, held_back};
pub use crate::removal::remove_deleted;
pub use crate::transfer::{Downloaded, TransferReport, download};
pub use crate::walk::{RemoteTree, walk, walk_remote};
