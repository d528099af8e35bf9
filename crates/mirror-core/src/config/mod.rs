//! Project configuration
//!
//! A project is a root directory holding a source tree, an artifact tree and
//! a hidden `.mirror/` state directory with `config.toml` and the manifest.

mod layout;

pub use layout::ProjectLayout;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use mirror_fs::{ConfigStore, MirrorPath, RelativePath, normalize_extension};

use crate::sync::ErrorMode;
use crate::{Error, Result};

fn default_source_dir() -> String {
    "sources".to_string()
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_source_extensions() -> Vec<String> {
    ["pdf", "docx", "pptx", "xlsx", "html", "htm", "md", "txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_artifact_extension() -> String {
    "md".to_string()
}

fn default_text_extensions() -> Vec<String> {
    [
        "md", "markdown", "txt", "csv", "json", "yaml", "yml", "html", "htm", "xml", "rst",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_index_file() -> String {
    MirrorPath::IndexFile.as_str().to_string()
}

fn default_jobs() -> usize {
    1
}

/// How each source file is turned into its artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConverterConfig {
    /// Copy the source bytes verbatim
    #[default]
    Copy,
    /// Run an external program; `{input}` and `{output}` in `args` are
    /// replaced with the native source and destination paths
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Settings parsed from `.mirror/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Name shown in the index header and stored in the manifest
    #[serde(default)]
    pub project_name: String,

    /// Source tree, relative to the project root
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Artifact tree, relative to the project root
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Extensions of source files that get converted
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Extension given to every produced artifact
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Extensions of artifact-tree files listed in the index
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,

    /// Name of the generated index file at the artifact root
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Behaviour when a single conversion fails
    #[serde(default)]
    pub on_error: ErrorMode,

    /// Number of conversion workers
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default)]
    pub converter: ConverterConfig,
}

impl ProjectConfig {
    /// Default configuration for a project rooted at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            project_name: project_name_from_root(root),
            source_dir: default_source_dir(),
            artifact_dir: default_artifact_dir(),
            source_extensions: default_source_extensions(),
            artifact_extension: default_artifact_extension(),
            text_extensions: default_text_extensions(),
            index_file: default_index_file(),
            on_error: ErrorMode::default(),
            jobs: default_jobs(),
            converter: ConverterConfig::default(),
        }
    }

    /// Load `.mirror/config.toml` under `root`, falling back to defaults
    /// when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root
            .join(MirrorPath::StateDir.as_str())
            .join(MirrorPath::ConfigFile.as_str());

        let mut config = if path.is_file() {
            ConfigStore::new().load::<Self>(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::for_root(root)
        };

        if config.project_name.trim().is_empty() {
            config.project_name = project_name_from_root(root);
        }
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration to `.mirror/config.toml` under `root`.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root
            .join(MirrorPath::StateDir.as_str())
            .join(MirrorPath::ConfigFile.as_str());
        ConfigStore::new().save(&path, self)?;
        Ok(())
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfig { message });

        if self.source_extension_set().is_empty() {
            return invalid("source_extensions must not be empty".into());
        }
        if normalize_extension(&self.artifact_extension).is_empty() {
            return invalid("artifact_extension must not be empty".into());
        }
        if self.jobs == 0 {
            return invalid("jobs must be at least 1".into());
        }

        let source = RelativePath::new(&self.source_dir).map_err(|e| Error::InvalidConfig {
            message: format!("source_dir: {e}"),
        })?;
        let artifacts = RelativePath::new(&self.artifact_dir).map_err(|e| Error::InvalidConfig {
            message: format!("artifact_dir: {e}"),
        })?;
        if source == artifacts {
            return invalid("source_dir and artifact_dir must differ".into());
        }

        let index = RelativePath::new(&self.index_file).map_err(|e| Error::InvalidConfig {
            message: format!("index_file: {e}"),
        })?;
        if index.parent().is_some() {
            return invalid("index_file must be a plain file name".into());
        }

        if let ConverterConfig::Command { program, .. } = &self.converter
            && program.trim().is_empty()
        {
            return invalid("converter.program must not be empty".into());
        }
        Ok(())
    }

    /// Normalized source extension allowlist.
    pub fn source_extension_set(&self) -> BTreeSet<String> {
        normalize_set(&self.source_extensions)
    }

    /// Normalized text extension allowlist used by the index.
    pub fn text_extension_set(&self) -> BTreeSet<String> {
        normalize_set(&self.text_extensions)
    }
}

fn normalize_set(extensions: &[String]) -> BTreeSet<String> {
    extensions
        .iter()
        .map(|e| normalize_extension(e))
        .filter(|e| !e.is_empty())
        .collect()
}

fn project_name_from_root(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "mirror".to_string())
}
