//! Resolved on-disk locations of a project

use std::path::{Path, PathBuf};

use mirror_fs::{MirrorPath, RelativePath};

use super::ProjectConfig;

/// Absolute paths derived from a project root and its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    source_root: PathBuf,
    artifact_root: PathBuf,
    index_file: String,
}

impl ProjectLayout {
    /// Resolve the layout for `root` using the directories named in
    /// `config`. The config is expected to be validated.
    pub fn new(root: &Path, config: &ProjectConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            source_root: resolve(root, &config.source_dir),
            artifact_root: resolve(root, &config.artifact_dir),
            index_file: config.index_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(MirrorPath::StateDir.as_str())
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join(MirrorPath::ConfigFile.as_str())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.state_dir().join(MirrorPath::ManifestFile.as_str())
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join(MirrorPath::LockFile.as_str())
    }

    /// File name of the generated index at the artifact root
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    pub fn index_path(&self) -> PathBuf {
        self.artifact_root.join(&self.index_file)
    }
}

fn resolve(root: &Path, dir: &str) -> PathBuf {
    match RelativePath::new(dir) {
        Ok(relative) => relative.to_native(root),
        Err(_) => root.join(dir),
    }
}
