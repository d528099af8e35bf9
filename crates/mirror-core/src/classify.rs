//! Change classification
//!
//! Decides, per discovered source, whether it needs processing by comparing
//! its content fingerprint with the manifest.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::discover::SourceFile;
use crate::manifest::Manifest;

/// How a source relates to its manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No manifest entry exists
    New,
    /// Fingerprint differs from the manifest, or processing was forced
    Modified,
    /// Fingerprint matches the manifest
    Unchanged,
}

impl Classification {
    /// Whether a source with this classification goes to the converter.
    pub fn needs_processing(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Modified => write!(f, "modified"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Compare a fingerprint against the manifest.
///
/// With `force`, the answer is always [`Classification::Modified`] and the
/// fingerprint is not looked at.
pub fn classify_fingerprint(
    entry_fingerprint: Option<&str>,
    fingerprint: impl FnOnce() -> Result<String>,
    force: bool,
) -> Result<Classification> {
    if force {
        return Ok(Classification::Modified);
    }
    match entry_fingerprint {
        None => Ok(Classification::New),
        Some(known) if known == fingerprint()? => Ok(Classification::Unchanged),
        Some(_) => Ok(Classification::Modified),
    }
}

/// Classify one source against the manifest.
///
/// The source is only hashed when a manifest entry exists and `force` is
/// off.
///
/// # Errors
///
/// Returns [`crate::Error::SourceUnreadable`] if hashing fails.
pub fn classify(source: &SourceFile, manifest: &Manifest, force: bool) -> Result<Classification> {
    let known = manifest.get(source.key()).map(|e| e.fingerprint.as_str());
    classify_fingerprint(known, || source.fingerprint().map(str::to_string), force)
}

/// Discovered sources split by classification, each list in key order.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// New and modified sources, queued for processing
    pub pending: Vec<(SourceFile, Classification)>,
    /// Sources that need no work
    pub unchanged: Vec<SourceFile>,
}

impl ChangeSet {
    /// Classify every source. Input order is preserved.
    ///
    /// A tracked source that cannot be hashed is queued as modified, so the
    /// failure is recorded per file instead of aborting the run.
    pub fn plan(sources: Vec<SourceFile>, manifest: &Manifest, force: bool) -> Self {
        let mut set = Self::default();
        for source in sources {
            let classification = match classify(&source, manifest, force) {
                Ok(classification) => classification,
                Err(e) => {
                    tracing::warn!(key = %source.key(), error = %e, "Cannot fingerprint source");
                    Classification::Modified
                }
            };
            tracing::debug!(key = %source.key(), %classification, "Classified source");
            if classification.needs_processing() {
                set.pending.push((source, classification));
            } else {
                set.unchanged.push(source);
            }
        }
        set
    }

    pub fn count(&self, classification: Classification) -> usize {
        match classification {
            Classification::Unchanged => self.unchanged.len(),
            other => self.pending.iter().filter(|(_, c)| *c == other).count(),
        }
    }
}
