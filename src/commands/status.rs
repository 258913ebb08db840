use super::load_bound;
use crate::error::{self, Result};
use crate::workspace::Workspace;
use time::UtcDateTime;
use treesync_engine::held_back;

pub async fn run(workspace: &Workspace) -> Result<()> {
    let (state, project) = load_bound(&workspace.store(false)).await?;
    println!("Project:      {} ({})", project.name, project.id);
    println!("Organisation: {}", project.organisation.name);
    match state.ledger.last_commit() {
        Some(commit) => println!("Last synced:  {} by {} at {}", commit.name, commit.author.name, commit.created_at),
        None => println!("Last synced:  never"),
    }

    let sync = workspace.synchronizer(&project.id, true)?;
    let since = state.ledger.last_commit().map_or(UtcDateTime::UNIX_EPOCH, |commit| commit.created_at);
    let listed = sync.remote().fetch_commits_since(since).await.map_err(error::remote)?;
    let pending = state.ledger.diff(&listed).remote_only;
    println!("\n{} commit(s) to pull", pending.len());
    for commit in &pending {
        println!("  {} by {} at {}", commit.name, commit.author.name, commit.created_at);
    }

    let waiting = held_back(&state.ledger);
    if !waiting.is_empty() {
        println!("\n{} file(s) held back, `pull --force` overwrites them", waiting.len());
        for file in &waiting {
            println!("  {} (v{})", file.target_path().display(), file.version);
        }
    }

    let modified = sync.local_changes(&state.ledger).await.map_err(error::sync)?;
    println!("\n{} file(s) changed locally", modified.len());
    for file in modified.iter() {
        println!("  {}", file.path().display());
    }
    Ok(())
}
