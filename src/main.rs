//! `treesync`: pull a remote project's file tree into a local directory.

mod commands;
mod error;
mod workspace;

use crate::commands::Command;
use crate::workspace::Workspace;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "treesync", version, about)]
struct Cli {
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Working directory to operate on.
    #[arg(short = 'C', long = "directory", global = true, default_value = ".")]
    directory: PathBuf,
    /// Directory holding the project export, overriding `remote.mirror`.
    #[arg(long, global = true)]
    mirror: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

/// Default log filter when `RUST_LOG` is not set.
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let workspace = Workspace::open(&cli.directory, cli.mirror).await?;
    let result = cli.command.run(&workspace).await;
    workspace.close().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            if err.is_retryable() {
                eprintln!("This may be temporary; try again.");
            }
            ExitCode::FAILURE
        },
    }
}
