//! Mirror CLI
//!
//! Exit status is 0 when a run completes, even if some files were skipped
//! after failing, and 1 on any fatal error or fail-fast abort.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;
use mirror_core::SyncOptions;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Some(cmd) => execute_command(root, cmd),
        None => {
            println!("{} keeps an artifact tree in sync with its sources", "mirror".green().bold());
            println!();
            println!("Run {} for available commands.", "mirror --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(root: PathBuf, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { name, force } => commands::run_init(&root, name.as_deref(), force),
        Commands::Sync {
            dry_run,
            force,
            no_clean,
            on_error,
            jobs,
            json,
        } => {
            let options = SyncOptions {
                dry_run,
                force,
                no_clean,
                on_error,
                jobs,
            };
            commands::run_sync(&root, &options, json)
        }
        Commands::Status { json } => commands::run_status(&root, json),
    }
}
