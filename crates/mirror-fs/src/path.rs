//! Canonical relative paths used as manifest keys
//!
//! Every path stored in the manifest is relative to a root directory and
//! uses forward slashes. Absolute paths and parent traversals are rejected,
//! which keeps the persisted state portable and guarantees that joining a
//! key onto a root can never escape it.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A forward-slash separated path relative to some root directory.
///
/// Ordering is plain byte-wise string ordering, which is what makes sorted
/// collections of keys deterministic across platforms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath {
    inner: String,
}

impl RelativePath {
    /// Parse a relative path from a string.
    ///
    /// Backslashes are treated as separators, `.` segments and repeated
    /// separators are collapsed.
    ///
    /// # Errors
    ///
    /// Fails for empty paths, absolute paths and paths containing `..`.
    pub fn new(path: &str) -> Result<Self> {
        let unified = path.replace('\\', "/");
        let invalid = |reason: &str| Error::InvalidRelativePath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(invalid("path must be relative"));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(invalid("parent traversal is not allowed")),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(invalid("path is empty"));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Build the key of `path` relative to `root`.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not located under `root` or is not valid UTF-8.
    pub fn from_path(root: &Path, path: &Path) -> Result<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| Error::InvalidRelativePath {
                path: path.display().to_string(),
                reason: format!("not under {}", root.display()),
            })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| Error::InvalidRelativePath {
                        path: path.display().to_string(),
                        reason: "path is not valid UTF-8".to_string(),
                    })?;
                    segments.push(part);
                }
                Component::CurDir => continue,
                _ => {
                    return Err(Error::InvalidRelativePath {
                        path: path.display().to_string(),
                        reason: "unexpected path component".to_string(),
                    });
                }
            }
        }

        Self::new(&segments.join("/"))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Resolve this key against a root directory into a native path.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.inner.split('/') {
            path.push(segment);
        }
        path
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// The extension of the final segment, as written.
    ///
    /// Dotfiles such as `.env` have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Whether the extension matches one of `allowed` (already normalized).
    pub fn has_extension_in<'a>(&self, allowed: impl IntoIterator<Item = &'a String>) -> bool {
        let Some(ext) = self.extension() else {
            return false;
        };
        let ext = normalize_extension(ext);
        allowed.into_iter().any(|candidate| *candidate == ext)
    }

    /// Replace (or add) the extension of the final segment.
    pub fn with_extension(&self, extension: &str) -> Self {
        let extension = normalize_extension(extension);
        let stem_end = match self.extension() {
            Some(ext) => self.inner.len() - ext.len() - 1,
            None => self.inner.len(),
        };
        let stem = &self.inner[..stem_end];
        let inner = if extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, extension)
        };
        Self { inner }
    }

    /// The parent key, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<Self> {
        self.inner.rfind('/').map(|idx| Self {
            inner: self.inner[..idx].to_string(),
        })
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Normalize a configured extension: trimmed, no leading dot, lower-case.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.inner
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}
