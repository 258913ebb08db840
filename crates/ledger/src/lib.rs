//! Local sync state.
//!
//! A working directory remembers two things between runs:
//! - the [`SyncLedger`]: every commit that has been applied locally, in the
//!   order it was applied, and
//! - the [`Binding`]: which remote project (and organisation) the directory
//!   belongs to.
//!
//! Both live in a small SQLite database (see [`Database`] and
//! [`StateStore`]). Unlike a cache, this database *is* the source of truth for
//! what was pulled: the engine derives its "last synced" baseline from the
//! digests recorded in the ledger.

mod binding;
mod db;
pub mod error;
mod ledger;
mod models;
mod store;

pub use crate::binding::Binding;
pub use crate::db::Database;
pub use crate::ledger::{LedgerDiff, SyncLedger};
pub use crate::store::{State, StateStore};
