mod init;
mod pull;
mod status;
mod tree;

pub use self::init::InitArgs;
pub use self::pull::PullArgs;
use crate::error::{ErrorKind, Result};
use crate::workspace::Workspace;
use clap::Subcommand;
use exn::ResultExt;
use treesync_ledger::{State, StateStore};
use treesync_model::Project;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bind this directory to a remote project.
    Init(InitArgs),
    /// Bring the directory up to date with the remote.
    Pull(PullArgs),
    /// Show the bound project, pending commits and local edits.
    Status,
    /// Print the remote folder tree.
    Tree,
}

impl Command {
    pub async fn run(self, workspace: &Workspace) -> Result<()> {
        match self {
            Self::Init(args) => init::run(workspace, args).await,
            Self::Pull(args) => pull::run(workspace, args).await,
            Self::Status => status::run(workspace).await,
            Self::Tree => tree::run(workspace).await,
        }
    }
}

/// Load the state of a directory that must already be bound to a project.
async fn load_bound(store: &StateStore) -> Result<(State, Project)> {
    let state = store.load().await.or_raise(|| ErrorKind::State)?;
    state.binding.require_initialized().or_raise(|| ErrorKind::State)?;
    let project = state.binding.active_project(None).or_raise(|| ErrorKind::State)?.clone();
    Ok((state, project))
}
