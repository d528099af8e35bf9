//! Source discovery
//!
//! Walks the source tree and returns every eligible file in a stable order.
//! Hidden files and hidden directories are skipped entirely, as are files
//! whose extension is not in the allowlist.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use walkdir::{DirEntry, WalkDir};

use mirror_fs::{RelativePath, compute_file_checksum};

use crate::{Error, Result};

/// A discovered source file.
///
/// The fingerprint is computed on first access and cached for the rest of
/// the run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    key: RelativePath,
    path: PathBuf,
    fingerprint: OnceLock<String>,
}

impl SourceFile {
    pub fn new(key: RelativePath, path: PathBuf) -> Self {
        Self {
            key,
            path,
            fingerprint: OnceLock::new(),
        }
    }

    /// Canonical key relative to the source root
    pub fn key(&self) -> &RelativePath {
        &self.key
    }

    /// Absolute location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content fingerprint, hashing the file on first call.
    pub fn fingerprint(&self) -> Result<&str> {
        if let Some(fingerprint) = self.fingerprint.get() {
            return Ok(fingerprint);
        }
        let computed = compute_file_checksum(&self.path)
            .map_err(|e| Error::source_unreadable(&self.path, e))?;
        Ok(self.fingerprint.get_or_init(|| computed))
    }
}

/// Enumerate source files under `root`.
///
/// Extensions in `allowed` must already be normalized (lower-case, no dot).
/// Directories listed in `excluded` are not descended into; this keeps an
/// artifact tree nested inside the source tree from being picked up.
///
/// # Errors
///
/// Returns [`Error::SourceUnreadable`] if the root is missing or any part
/// of the tree cannot be listed.
pub fn discover(
    root: &Path,
    allowed: &BTreeSet<String>,
    excluded: &[PathBuf],
) -> Result<Vec<SourceFile>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::source_unreadable(root, e))?;
    if !metadata.is_dir() {
        return Err(Error::source_unreadable(
            root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || (!is_hidden(entry) && !excluded.iter().any(|dir| entry.path() == dir))
        });

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::source_unreadable(path, e.into())
        })?;

        if !is_file(&entry) {
            continue;
        }

        let key = match RelativePath::from_path(root, entry.path()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Skipping source");
                continue;
            }
        };

        if !key.has_extension_in(allowed) {
            tracing::trace!(key = %key, "Unsupported extension");
            continue;
        }

        sources.push(SourceFile::new(key, entry.into_path()));
    }

    sources.sort_by(|a, b| a.key.cmp(&b.key));
    tracing::debug!(root = %root.display(), count = sources.len(), "Discovered sources");
    Ok(sources)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}
