//! Shared data model for treesync.
//!
//! Everything the remote hands us (commits, file descriptors, folder
//! descriptors, project details) and everything we derive locally (content
//! digests of files on disk) is described here, so that the storage, ledger
//! and engine crates agree on a single vocabulary.
//!
//! # Paths
//! Remote paths are `/`-separated and always start with the name of the
//! project's root folder. The working directory *is* that root folder, so the
//! first component is stripped whenever a remote path is mapped onto disk
//! (see [`FileIdentity::target_path`]).

mod commit;
pub mod error;
mod file;
mod id;
mod project;
mod tree;

pub use crate::commit::{Author, Change, ChangeKind, CommitRecord};
pub use crate::file::{Digest, FileIdentity, FileVersion, LocalFileState};
pub use crate::id::{CommitId, FileId, FolderId, ProjectId};
pub use crate::project::{Organisation, Project};
pub use crate::tree::{Folder, FolderDescriptor, Node, NodeRef, ResolvedNode};
