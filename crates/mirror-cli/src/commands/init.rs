//! Init command implementation

use std::path::Path;

use colored::Colorize;

use mirror_core::{ProjectConfig, SyncEngine};

use crate::error::Result;

/// Set up a project at `root`.
///
/// An existing `config.toml` is kept; `--name` updates its project name
/// once the manifest has been initialized.
pub fn run_init(root: &Path, name: Option<&str>, force: bool) -> Result<()> {
    std::fs::create_dir_all(root)?;

    let mut config = ProjectConfig::load(root)?;
    if let Some(name) = name {
        config.project_name = name.to_string();
    }

    let engine = SyncEngine::with_config(root, config)?;
    engine.init(force)?;
    if name.is_some() {
        engine.config().save(root)?;
    }

    let layout = engine.layout();
    println!(
        "{} Initialized {} at {}",
        "OK".green().bold(),
        engine.config().project_name.cyan(),
        root.display()
    );
    println!("   {} sources:   {}", "-".dimmed(), layout.source_root().display());
    println!("   {} artifacts: {}", "-".dimmed(), layout.artifact_root().display());
    if force {
        println!("   {} manifest reset", "!".yellow());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_layout() {
        let temp = TempDir::new().unwrap();

        run_init(temp.path(), Some("handbook"), false).unwrap();

        assert!(temp.path().join(".mirror/config.toml").is_file());
        assert!(temp.path().join(".mirror/manifest.json").is_file());
        assert!(temp.path().join("sources").is_dir());
        assert!(temp.path().join("artifacts").is_dir());
        assert_eq!(ProjectConfig::load(temp.path()).unwrap().project_name, "handbook");
    }

    #[test]
    fn second_init_needs_force() {
        let temp = TempDir::new().unwrap();
        run_init(temp.path(), None, false).unwrap();

        assert!(run_init(temp.path(), None, false).is_err());
        assert!(run_init(temp.path(), None, true).is_ok());
    }

    #[test]
    fn refused_init_keeps_existing_name() {
        let temp = TempDir::new().unwrap();
        run_init(temp.path(), Some("original"), false).unwrap();

        assert!(run_init(temp.path(), Some("renamed"), false).is_err());
        assert_eq!(ProjectConfig::load(temp.path()).unwrap().project_name, "original");

        run_init(temp.path(), Some("renamed"), true).unwrap();
        assert_eq!(ProjectConfig::load(temp.path()).unwrap().project_name, "renamed");
    }
}
