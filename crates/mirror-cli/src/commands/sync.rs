//! Sync command implementation

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use mirror_core::{
    CancelToken, FileStatus, OrphanAction, SyncEngine, SyncOptions, SyncRunResult, SyncSummary,
};

use crate::error::Result;

/// JSON shape of `mirror sync --json`
#[derive(Serialize)]
struct JsonReport<'a> {
    summary: SyncSummary,
    #[serde(flatten)]
    result: &'a SyncRunResult,
}

/// Run the sync command.
///
/// Skipped failures are printed but do not make the command fail.
pub fn run_sync(root: &Path, options: &SyncOptions, json: bool) -> Result<()> {
    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone());

    let engine = SyncEngine::new(root)?.with_cancel_token(cancel);

    if !json {
        let verb = if options.dry_run { "Previewing" } else { "Synchronizing" };
        println!("{} {} {}...", "=>".blue().bold(), verb, engine.config().project_name.cyan());
    }

    let result = engine.run(options)?;

    if json {
        print_json(&result)?;
    } else {
        print_result(&result);
    }
    Ok(())
}

pub(crate) fn print_json(result: &SyncRunResult) -> Result<()> {
    let report = JsonReport {
        summary: result.summary(),
        result,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) fn print_result(result: &SyncRunResult) {
    let pending_marker = if result.dry_run { "would process" } else { "processed" };

    for file in &result.files {
        match &file.status {
            FileStatus::Unchanged => {}
            FileStatus::Pending => {
                println!(
                    "   {} {} ({})",
                    "~".yellow(),
                    file.key.as_str().cyan(),
                    file.classification.to_string().dimmed()
                );
            }
            FileStatus::Converted => {
                println!(
                    "   {} {} -> {}",
                    "+".green(),
                    file.key.as_str().cyan(),
                    file.output
                );
            }
            FileStatus::Failed { error } => {
                println!("   {} {}: {}", "!".red(), file.key.as_str().cyan(), error);
            }
        }
    }

    for orphan in &result.orphans.outcomes {
        match &orphan.action {
            OrphanAction::Removed => {
                println!("   {} {} (source gone)", "-".red(), orphan.output);
            }
            OrphanAction::EntryPruned => {
                println!("   {} {} (entry pruned)", "-".dimmed(), orphan.key);
            }
            OrphanAction::Preserved => {
                println!("   {} {} (orphan kept)", "?".yellow(), orphan.output);
            }
            OrphanAction::RemovalFailed { error } => {
                println!("   {} {}: {}", "!".red(), orphan.output, error);
            }
        }
    }

    let summary = result.summary();
    let headline = if result.dry_run {
        "DRY RUN".yellow().bold()
    } else if result.has_failures() {
        "DONE".yellow().bold()
    } else {
        "OK".green().bold()
    };
    println!(
        "{} {} new, {} modified, {} unchanged ({}), {} failed",
        headline,
        summary.new,
        summary.modified,
        summary.unchanged,
        pending_marker,
        summary.failed
    );
    println!(
        "   orphans: {} detected, {} removed, {} kept, {} failed; index: {} files{}",
        summary.orphans_detected,
        summary.orphans_removed,
        summary.orphans_skipped,
        summary.orphans_failed,
        result.index_files,
        if result.index_written { " (rewritten)" } else { "" }
    );
}

/// Cancel `token` on the first Ctrl-C; exit immediately on the second.
fn cancel_on_interrupt(token: CancelToken) {
    let spawned = std::thread::Builder::new()
        .name("mirror-interrupt".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "Interrupt handling unavailable");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                eprintln!(
                    "{} Interrupted, finishing the current file. Press Ctrl-C again to exit now.",
                    "!".yellow().bold()
                );
                token.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to spawn interrupt handler");
    }
}
