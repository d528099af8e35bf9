//! Loading and committing the manifest file

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mirror_fs::io;

use super::Manifest;
use crate::{Error, Result};

/// Owner of the on-disk manifest.
///
/// Nothing is written until [`ManifestStore::commit`] is called, and a
/// commit replaces the file atomically.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the manifest, treating a missing file as an error.
    ///
    /// # Errors
    ///
    /// - [`Error::ManifestMissing`] if there is no manifest file
    /// - [`Error::ManifestCorrupt`] if it cannot be parsed or validated
    pub fn load(&self) -> Result<Manifest> {
        self.load_optional()?.ok_or_else(|| Error::ManifestMissing {
            path: self.path.clone(),
        })
    }

    /// Load the manifest, returning `None` if no file exists yet.
    pub fn load_optional(&self) -> Result<Option<Manifest>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not valid UTF-8 ({e})")));
            }
            Err(e) => return Err(mirror_fs::Error::io(&self.path, e).into()),
        };

        if content.trim().is_empty() {
            return Err(self.corrupt("file is empty".to_string()));
        }

        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        tracing::debug!(
            path = %self.path.display(),
            entries = manifest.len(),
            "Loaded manifest"
        );
        Ok(Some(manifest))
    }

    /// Create an empty manifest on disk.
    ///
    /// An existing manifest, readable or not, is only replaced when
    /// `force` is set.
    pub fn initialize(&self, project_name: &str, force: bool) -> Result<Manifest> {
        if self.path.exists() && !force {
            return Err(Error::AlreadyInitialized {
                path: self.path.clone(),
            });
        }

        let manifest = Manifest::new(project_name);
        self.commit(&manifest)?;
        tracing::info!(path = %self.path.display(), "Initialized empty manifest");
        Ok(manifest)
    }

    /// Atomically replace the persisted manifest.
    pub fn commit(&self, manifest: &Manifest) -> Result<()> {
        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');
        io::write_atomic(&self.path, content.as_bytes())?;

        tracing::debug!(
            path = %self.path.display(),
            entries = manifest.len(),
            "Committed manifest"
        );
        Ok(())
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::ManifestCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}
