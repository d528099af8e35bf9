//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mirror_core::ErrorMode;

/// Mirror - keep a derived artifact tree in sync with its sources
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long = "project", global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize a project
    ///
    /// Creates .mirror/ with config.toml and an empty manifest, plus the
    /// source and artifact directories.
    ///
    /// Examples:
    ///   mirror init                  # Initialize in current directory
    ///   mirror init --name handbook  # Set the project name
    ///   mirror init --force          # Reset a corrupt manifest
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Replace an existing manifest with an empty one
        #[arg(long)]
        force: bool,
    },

    /// Convert new and changed sources, collect orphans, rebuild the index
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Reprocess every source regardless of fingerprints
        #[arg(long)]
        force: bool,

        /// Report orphaned artifacts but keep them
        #[arg(long)]
        no_clean: bool,

        /// What to do when a conversion fails (skip or fail)
        #[arg(long, value_name = "MODE")]
        on_error: Option<ErrorMode>,

        /// Number of parallel conversions
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show project state and pending work
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
