//! Orphaned artifact collection
//!
//! An orphan is a manifest entry whose source no longer exists. Only files
//! referenced by such entries can ever be deleted: anything in the artifact
//! tree without a manifest entry is never inspected here, which is what
//! keeps user-added content safe.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use mirror_fs::{RelativePath, io};

use crate::manifest::Manifest;
use crate::{Error, Result};

/// A manifest entry whose source has disappeared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanCandidate {
    /// Source key of the entry
    pub key: RelativePath,
    /// Artifact path recorded for it
    pub output: RelativePath,
    /// Whether the artifact may be deleted: it exists on disk, is not the
    /// index and is not also the output of a live entry
    pub removable: bool,
}

/// What happened to one orphan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrphanAction {
    /// Artifact deleted and entry dropped
    Removed,
    /// Artifact was not removable, entry dropped
    EntryPruned,
    /// Cleanup disabled, artifact and entry kept
    Preserved,
    /// Deleting the artifact failed, artifact and entry kept
    RemovalFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanOutcome {
    pub key: RelativePath,
    pub output: RelativePath,
    #[serde(flatten)]
    pub action: OrphanAction,
}

/// Result of an orphan collection pass, in key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub outcomes: Vec<OrphanOutcome>,
}

impl OrphanReport {
    pub fn detected(&self) -> usize {
        self.outcomes.len()
    }

    /// Entries dropped from the manifest, with or without a file deletion
    pub fn removed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, OrphanAction::Removed | OrphanAction::EntryPruned))
            .count()
    }

    /// Orphans left in place because cleanup was disabled
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action == OrphanAction::Preserved)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, OrphanAction::RemovalFailed { .. }))
            .count()
    }
}

/// Finds and removes orphaned artifacts under an artifact root.
#[derive(Debug, Clone, Copy)]
pub struct OrphanCollector<'a> {
    artifact_root: &'a Path,
    index_file: &'a str,
}

impl<'a> OrphanCollector<'a> {
    pub fn new(artifact_root: &'a Path, index_file: &'a str) -> Self {
        Self {
            artifact_root,
            index_file,
        }
    }

    /// List orphan candidates without touching anything.
    ///
    /// `live` holds the keys of every source found by the current
    /// discovery pass. `pending_outputs` are outputs that live sources
    /// without a manifest entry yet will produce; they are protected like
    /// the outputs of tracked live entries.
    pub fn detect(
        &self,
        manifest: &Manifest,
        live: &BTreeSet<RelativePath>,
        pending_outputs: &BTreeSet<RelativePath>,
    ) -> Result<Vec<OrphanCandidate>> {
        let present = self.list_artifacts()?;
        let live_outputs: BTreeSet<&RelativePath> = manifest
            .entries()
            .filter(|(key, _)| live.contains(*key))
            .map(|(_, entry)| &entry.output)
            .chain(pending_outputs)
            .collect();

        let candidates = manifest
            .entries()
            .filter(|(key, _)| !live.contains(*key))
            .map(|(key, entry)| OrphanCandidate {
                key: key.clone(),
                output: entry.output.clone(),
                removable: present.contains(&entry.output)
                    && !self.is_index(&entry.output)
                    && !live_outputs.contains(&entry.output),
            })
            .collect();
        Ok(candidates)
    }

    /// Report what [`OrphanCollector::collect`] would do, without doing it.
    ///
    /// `pending_outputs` are the outputs the skipped processing step would
    /// have recorded in the manifest.
    pub fn preview(
        &self,
        manifest: &Manifest,
        live: &BTreeSet<RelativePath>,
        pending_outputs: &BTreeSet<RelativePath>,
        no_clean: bool,
    ) -> Result<OrphanReport> {
        let outcomes = self
            .detect(manifest, live, pending_outputs)?
            .into_iter()
            .map(|candidate| OrphanOutcome {
                action: if no_clean {
                    OrphanAction::Preserved
                } else if candidate.removable {
                    OrphanAction::Removed
                } else {
                    OrphanAction::EntryPruned
                },
                key: candidate.key,
                output: candidate.output,
            })
            .collect();
        Ok(OrphanReport { outcomes })
    }

    /// Detect orphans and, unless `no_clean` is set, remove them.
    ///
    /// A removable artifact and its manifest entry are dropped together;
    /// if deletion fails both stay. Removal failures are reported, never
    /// raised.
    pub fn collect(
        &self,
        manifest: &mut Manifest,
        live: &BTreeSet<RelativePath>,
        no_clean: bool,
    ) -> Result<OrphanReport> {
        let candidates = self.detect(manifest, live, &BTreeSet::new())?;
        let mut report = OrphanReport::default();

        for candidate in candidates {
            let action = if no_clean {
                OrphanAction::Preserved
            } else if candidate.removable {
                self.remove_artifact(&candidate.output)
            } else {
                OrphanAction::EntryPruned
            };

            match &action {
                OrphanAction::Removed | OrphanAction::EntryPruned => {
                    manifest.remove(&candidate.key);
                    tracing::info!(key = %candidate.key, output = %candidate.output, ?action, "Collected orphan");
                }
                OrphanAction::Preserved => {
                    tracing::info!(key = %candidate.key, output = %candidate.output, "Orphan kept (cleanup disabled)");
                }
                OrphanAction::RemovalFailed { error } => {
                    tracing::warn!(key = %candidate.key, output = %candidate.output, %error, "Failed to remove orphan");
                }
            }

            report.outcomes.push(OrphanOutcome {
                key: candidate.key,
                output: candidate.output,
                action,
            });
        }

        Ok(report)
    }

    fn remove_artifact(&self, output: &RelativePath) -> OrphanAction {
        let path = output.to_native(self.artifact_root);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                if let Some(parent) = path.parent() {
                    io::prune_empty_dirs(parent, self.artifact_root);
                }
                OrphanAction::Removed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => OrphanAction::EntryPruned,
            Err(e) => OrphanAction::RemovalFailed {
                error: e.to_string(),
            },
        }
    }

    fn is_index(&self, output: &RelativePath) -> bool {
        output.as_str() == self.index_file
    }

    /// Every regular file under the artifact root. A missing root is empty.
    fn list_artifacts(&self) -> Result<BTreeSet<RelativePath>> {
        let mut files = BTreeSet::new();
        if !self.artifact_root.exists() {
            return Ok(files);
        }

        for entry in WalkDir::new(self.artifact_root) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.artifact_root).to_path_buf();
                Error::artifact_directory(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(key) = RelativePath::from_path(self.artifact_root, entry.path()) {
                files.insert(key);
            }
        }
        Ok(files)
    }
}
