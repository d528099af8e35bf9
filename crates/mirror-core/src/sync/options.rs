//! Run flags

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do when a single conversion fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Record the failure and continue with the next file
    #[default]
    Skip,
    /// Abort the run without saving any state
    Fail,
}

impl FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("invalid error mode '{other}' (expected 'skip' or 'fail')")),
        }
    }
}

impl std::fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Options for a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Compute what would happen without touching the filesystem or the
    /// manifest
    pub dry_run: bool,
    /// Reprocess every source regardless of fingerprints
    pub force: bool,
    /// Report orphans but never delete them
    pub no_clean: bool,
    /// Overrides the configured error mode
    pub on_error: Option<ErrorMode>,
    /// Overrides the configured worker count
    pub jobs: Option<usize>,
}
