//! Status command implementation
//!
//! Shows what the manifest records and what a sync would do right now.

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use mirror_core::{SyncEngine, SyncOptions, SyncSummary};

use crate::error::Result;

#[derive(Debug, Serialize)]
struct StatusReport {
    project_name: String,
    last_sync_at: Option<DateTime<Utc>>,
    tool_version: Option<String>,
    tracked: usize,
    failed_entries: usize,
    pending: SyncSummary,
}

pub fn run_status(root: &Path, json: bool) -> Result<()> {
    let engine = SyncEngine::new(root)?;
    let manifest = engine.manifest_store().load()?;
    let preview = engine.run(&SyncOptions {
        dry_run: true,
        ..Default::default()
    })?;

    let report = StatusReport {
        project_name: manifest.project_name.clone(),
        last_sync_at: manifest.last_sync_at,
        tool_version: manifest.tool_version.clone(),
        tracked: manifest.len(),
        failed_entries: manifest.failed_count(),
        pending: preview.summary(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Project:".bold(), report.project_name.cyan());
    match report.last_sync_at {
        Some(at) => println!("{} {}", "Last sync:".bold(), at.to_rfc3339()),
        None => println!("{} {}", "Last sync:".bold(), "never".dimmed()),
    }
    println!(
        "{} {} tracked, {} failed",
        "Manifest:".bold(),
        report.tracked,
        report.failed_entries
    );

    let pending = report.pending;
    if pending.new + pending.modified + pending.orphans_detected == 0 {
        println!("{} Up to date.", "OK".green().bold());
    } else {
        println!(
            "{} {} new, {} modified, {} orphaned",
            "PENDING".yellow().bold(),
            pending.new,
            pending.modified,
            pending.orphans_detected
        );
        println!("Run {} to apply.", "mirror sync".cyan());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_test_utils::TestProject;

    #[test]
    fn status_does_not_modify_project() {
        let project = TestProject::new();
        project.write_source("a.pdf", "alpha");
        let before = project.manifest_bytes();

        run_status(project.root(), true).unwrap();

        assert_eq!(project.manifest_bytes(), before);
        assert!(project.artifact_tree().is_empty());
    }
}
