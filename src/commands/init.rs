use crate::error::{self, ErrorKind, Result};
use crate::workspace::Workspace;
use clap::Args;
use exn::ResultExt;
use treesync_ledger::Binding;
use treesync_model::ProjectId;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project URL, containing `/projects/<id>`.
    #[arg(long)]
    pub url: String,
}

pub async fn run(workspace: &Workspace, args: InitArgs) -> Result<()> {
    let store = workspace.store(false);
    let mut state = store.load().await.or_raise(|| ErrorKind::State)?;
    if let Some(project) = &state.binding.project {
        println!("Already initialized for project {} ({}).", project.name, project.id);
        return Ok(());
    }

    let id = ProjectId::from_url(&args.url).or_raise(|| ErrorKind::InvalidInput)?;
    let project = workspace.remote(&id)?.fetch_project().await.map_err(error::remote)?;
    println!("Initialized for project {} ({}) of {}.", project.name, project.id, project.organisation.name);
    tracing::info!(project = %project.id, root = %project.root_folder_id, "bound working directory");
    state.binding = Binding::bind(project);
    store.save(&state).await.or_raise(|| ErrorKind::State)
}
