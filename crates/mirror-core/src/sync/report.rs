//! Run results

use serde::{Deserialize, Serialize};

use mirror_fs::RelativePath;

use super::SyncPhase;
use crate::classify::Classification;
use crate::orphan::OrphanReport;

/// What happened to one discovered source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    /// Not submitted, fingerprint matched
    Unchanged,
    /// Would be processed (dry-run only)
    Pending,
    /// Converted successfully
    Converted,
    /// Conversion failed; recorded in the manifest as `failed`
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub key: RelativePath,
    pub classification: Classification,
    pub output: RelativePath,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// Aggregate counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub new: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub orphans_detected: usize,
    pub orphans_removed: usize,
    pub orphans_skipped: usize,
    pub orphans_failed: usize,
}

/// Everything a run did, returned to the caller and never persisted.
///
/// `files` is sorted by key. In dry-run mode nothing was written and
/// pending work shows up as [`FileStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunResult {
    pub dry_run: bool,
    pub phase: SyncPhase,
    pub files: Vec<FileOutcome>,
    pub orphans: OrphanReport,
    /// Number of entries listed in the index
    pub index_files: usize,
    /// Whether the index file was rewritten
    pub index_written: bool,
}

impl SyncRunResult {
    fn count(&self, classification: Classification) -> usize {
        self.files
            .iter()
            .filter(|f| f.classification == classification)
            .count()
    }

    pub fn new_count(&self) -> usize {
        self.count(Classification::New)
    }

    pub fn modified_count(&self) -> usize {
        self.count(Classification::Modified)
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(Classification::Unchanged)
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0 || self.orphans.failed() > 0
    }

    /// Outcome for a single key.
    pub fn outcome(&self, key: &str) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.key.as_str() == key)
    }

    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            new: self.new_count(),
            modified: self.modified_count(),
            unchanged: self.unchanged_count(),
            failed: self.failed_count(),
            orphans_detected: self.orphans.detected(),
            orphans_removed: self.orphans.removed(),
            orphans_skipped: self.orphans.skipped(),
            orphans_failed: self.orphans.failed(),
        }
    }
}
