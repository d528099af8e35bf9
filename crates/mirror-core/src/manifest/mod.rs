//! Persistent sync state
//!
//! The manifest maps every tracked source key to the result of its last
//! processing attempt. It is loaded once per run, mutated in memory and
//! committed once through [`ManifestStore`].

mod entry;
mod store;

pub use entry::{EntryStatus, ManifestEntry};
pub use store::ManifestStore;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mirror_fs::RelativePath;

/// Full persisted state of a project.
///
/// `files` is ordered by key so the serialized form is stable for equal
/// state regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub project_name: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Version of the tool that last committed this manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    files: BTreeMap<RelativePath, ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            last_sync_at: None,
            tool_version: None,
            files: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &RelativePath) -> Option<&ManifestEntry> {
        self.files.get(key)
    }

    pub fn contains(&self, key: &RelativePath) -> bool {
        self.files.contains_key(key)
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: RelativePath, entry: ManifestEntry) -> Option<ManifestEntry> {
        self.files.insert(key, entry)
    }

    pub fn remove(&mut self, key: &RelativePath) -> Option<ManifestEntry> {
        self.files.remove(key)
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&RelativePath, &ManifestEntry)> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of entries whose last attempt failed.
    pub fn failed_count(&self) -> usize {
        self.files.values().filter(|e| !e.is_success()).count()
    }

    /// Stamp run-level metadata before a commit.
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_sync_at = Some(at);
        self.tool_version = Some(env!("CARGO_PKG_VERSION").to_string());
    }
}
