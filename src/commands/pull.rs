use super::load_bound;
use crate::error::{self, ErrorKind, Result};
use crate::workspace::Workspace;
use clap::Args;
use exn::ResultExt;
use std::fmt::Write;
use time::UtcDateTime;
use treesync_engine::{PullOptions, PullReport, held_back};

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Overwrite files that were edited locally.
    #[arg(long)]
    pub force: bool,
    /// Only print errors.
    #[arg(short, long)]
    pub quiet: bool,
    /// Fetch everything but change nothing on disk and save no state.
    #[arg(long)]
    pub dry_run: bool,
    /// Maximum number of concurrent remote requests, overriding
    /// `transfer.batch_size`.
    #[arg(long)]
    pub batch_size: Option<usize>,
}

pub async fn run(workspace: &Workspace, args: PullArgs) -> Result<()> {
    let store = workspace.store(args.dry_run);
    let (mut state, project) = load_bound(&store).await?;
    let sync = workspace.synchronizer(&project.id, args.dry_run)?;

    let since = state.ledger.last_commit().map_or(UtcDateTime::UNIX_EPOCH, |commit| commit.created_at);
    let listed = sync.remote().fetch_commits_since(since).await.map_err(error::remote)?;
    let pending = state.ledger.diff(&listed).remote_only;
    let waiting = held_back(&state.ledger).len();
    tracing::debug!(listed = listed.len(), pending = pending.len(), waiting, %since, "compared remote commits");
    if pending.is_empty() && (waiting == 0 || !args.force) {
        if !args.quiet {
            println!("{}", up_to_date(waiting));
        }
        return Ok(());
    }

    let options = PullOptions {
        force: args.force,
        quiet: args.quiet,
        batch_size: args.batch_size.unwrap_or(workspace.config().transfer.batch_size),
        progress: workspace.progress_policy(),
    };
    let report = sync.pull(&mut state.ledger, pending, &options).await.map_err(error::sync)?;
    if !args.quiet {
        print!("{}", summary(&report));
    }
    store.save(&state).await.or_raise(|| ErrorKind::State)
}

fn up_to_date(waiting: usize) -> String {
    match waiting {
        0 => "Already up to date.".to_string(),
        n => format!("Already up to date; {n} file(s) held back (edited locally, use --force to overwrite)."),
    }
}

fn summary(report: &PullReport) -> String {
    let mut out = String::new();
    for path in &report.removed {
        let _ = writeln!(out, "removed     {}", path.display());
    }
    for downloaded in &report.downloaded {
        let _ = writeln!(out, "downloaded  {} ({} bytes)", downloaded.file.target_path().display(), downloaded.bytes);
    }
    for file in &report.held_back {
        let path = file.target_path();
        let _ = writeln!(out, "held back   {} (edited locally, use --force to overwrite)", path.display());
    }
    let _ = writeln!(out, "{} commit(s) applied.", report.appended);
    out
}
