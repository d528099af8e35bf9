//! Per-source manifest entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mirror_fs::RelativePath;

/// Outcome of the last processing attempt for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Success,
    Failed,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tracked state of one source file.
///
/// Entries are only ever created whole, from a finished processing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Content fingerprint of the source at processing time
    pub fingerprint: String,
    /// When the source was processed
    pub processed_at: DateTime<Utc>,
    /// Artifact path, relative to the artifact root
    pub output: RelativePath,
    pub status: EntryStatus,
    /// Failure message when `status` is `failed`
    pub error: Option<String>,
}

impl ManifestEntry {
    /// Entry for a successful conversion.
    pub fn success(fingerprint: String, output: RelativePath, processed_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            processed_at,
            output,
            status: EntryStatus::Success,
            error: None,
        }
    }

    /// Entry for a failed conversion.
    pub fn failed(
        fingerprint: String,
        output: RelativePath,
        processed_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            fingerprint,
            processed_at,
            output,
            status: EntryStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }
}
