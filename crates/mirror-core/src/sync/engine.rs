//! SyncEngine implementation
//!
//! Drives one run: discover sources, classify them against the manifest,
//! convert what changed, collect orphans, rebuild the index and commit the
//! manifest. The manifest is loaded once into memory and committed once at
//! the end; any fatal error before that leaves the file untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use mirror_fs::{RelativePath, RunLock};

use super::phase::PhaseTracker;
use super::worker::{Conflict, Job, WorkerPool};
use super::{CancelToken, FileOutcome, FileStatus, SyncOptions, SyncPhase, SyncRunResult};
use crate::classify::{ChangeSet, Classification};
use crate::config::{ProjectConfig, ProjectLayout};
use crate::converter::{self, Converter};
use crate::discover::{SourceFile, discover};
use crate::index::IndexBuilder;
use crate::manifest::{Manifest, ManifestStore};
use crate::orphan::OrphanCollector;
use crate::{Error, Result};

/// Engine for synchronizing the artifact tree with the source tree
pub struct SyncEngine {
    config: ProjectConfig,
    layout: ProjectLayout,
    converter: Box<dyn Converter>,
    cancel: CancelToken,
}

impl SyncEngine {
    /// Create an engine for the project at `root`, reading
    /// `.mirror/config.toml` if present.
    pub fn new(root: &Path) -> Result<Self> {
        let config = ProjectConfig::load(root)?;
        Self::with_config(root, config)
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(root: &Path, config: ProjectConfig) -> Result<Self> {
        config.validate()?;
        let layout = ProjectLayout::new(root, &config);
        let converter = converter::from_config(&config.converter);
        Ok(Self {
            config,
            layout,
            converter,
            cancel: CancelToken::new(),
        })
    }

    /// Replace the converter built from configuration.
    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Use a token that can cancel runs from another thread.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(self.layout.manifest_path())
    }

    /// Set up a new project: state directory, config file (kept if it
    /// already exists), source and artifact directories, empty manifest.
    ///
    /// With `force`, an existing or corrupt manifest is replaced.
    pub fn init(&self, force: bool) -> Result<Manifest> {
        let _lock = RunLock::acquire(&self.layout.lock_path())?;

        if !self.layout.config_path().exists() {
            self.config.save(self.layout.root())?;
        }
        fs::create_dir_all(self.layout.source_root())
            .map_err(|e| Error::source_unreadable(self.layout.source_root(), e))?;
        fs::create_dir_all(self.layout.artifact_root())
            .map_err(|e| Error::artifact_directory(self.layout.artifact_root(), e))?;

        self.manifest_store()
            .initialize(&self.config.project_name, force)
    }

    /// Run a sync.
    ///
    /// # Errors
    ///
    /// Fatal conditions abort before the manifest is committed: a missing
    /// or corrupt manifest, an unreadable source tree, an artifact
    /// directory that cannot be created, a failure in fail-fast mode,
    /// cancellation, or another run holding the lock. Recoverable failures
    /// are reported in the returned [`SyncRunResult`].
    pub fn run(&self, options: &SyncOptions) -> Result<SyncRunResult> {
        let store = self.manifest_store();
        if !store.exists() {
            return Err(Error::ManifestMissing {
                path: store.path().to_path_buf(),
            });
        }

        let _lock = RunLock::acquire(&self.layout.lock_path())?;
        let mut phase = PhaseTracker::new();

        let result = self.run_phases(&store, options, &mut phase);
        if let Err(e) = &result {
            if !phase.current().is_terminal() {
                phase.advance(SyncPhase::Aborted);
            }
            tracing::error!(error = %e, "Sync aborted");
        }
        result
    }

    fn run_phases(
        &self,
        store: &ManifestStore,
        options: &SyncOptions,
        phase: &mut PhaseTracker,
    ) -> Result<SyncRunResult> {
        let mut manifest = store.load()?;

        let sources = discover(
            self.layout.source_root(),
            &self.config.source_extension_set(),
            &self.discovery_exclusions(),
        )?;
        let live: BTreeSet<RelativePath> = sources.iter().map(|s| s.key().clone()).collect();

        phase.advance(SyncPhase::Classifying);
        let changes = ChangeSet::plan(sources, &manifest, options.force);
        tracing::info!(
            new = changes.count(Classification::New),
            modified = changes.count(Classification::Modified),
            unchanged = changes.count(Classification::Unchanged),
            "Classified sources"
        );

        if options.dry_run {
            phase.advance(SyncPhase::Previewing);
            return self.preview(&manifest, &changes, &live, options);
        }

        self.ensure_artifact_root()?;

        phase.advance(SyncPhase::Processing);
        self.check_cancelled()?;
        let jobs = self.jobs(&manifest, &changes, options.force);
        let pool = WorkerPool {
            converter: self.converter.as_ref(),
            artifact_root: self.layout.artifact_root(),
            error_mode: options.on_error.unwrap_or(self.config.on_error),
            workers: options.jobs.unwrap_or(self.config.jobs),
            cancel: &self.cancel,
        };
        let processed = pool.run(jobs)?;

        let mut outcomes: BTreeMap<RelativePath, FileOutcome> = changes
            .unchanged
            .iter()
            .map(|source| (source.key().clone(), self.unchanged_outcome(&manifest, source)))
            .collect();
        for (key, done) in processed {
            manifest.insert(key.clone(), done.entry);
            outcomes.insert(key, done.outcome);
        }

        phase.advance(SyncPhase::Collecting);
        self.check_cancelled()?;
        self.settle(store, manifest, &live, outcomes, options, phase)
    }

    /// Collect orphans, rebuild the index and commit the manifest.
    ///
    /// Not cancellable: collection deletes artifacts, so once it starts the
    /// manifest has to be committed to match.
    fn settle(
        &self,
        store: &ManifestStore,
        mut manifest: Manifest,
        live: &BTreeSet<RelativePath>,
        outcomes: BTreeMap<RelativePath, FileOutcome>,
        options: &SyncOptions,
        phase: &mut PhaseTracker,
    ) -> Result<SyncRunResult> {
        let orphans = OrphanCollector::new(self.layout.artifact_root(), self.layout.index_file())
            .collect(&mut manifest, live, options.no_clean)?;

        phase.advance(SyncPhase::Indexing);
        let now = Utc::now();
        let text_extensions = self.config.text_extension_set();
        let (index, index_written) = IndexBuilder::new(
            self.layout.artifact_root(),
            &text_extensions,
            self.layout.index_file(),
            &self.config.project_name,
        )
        .write(now)?;

        phase.advance(SyncPhase::Committing);
        manifest.mark_synced(now);
        store.commit(&manifest)?;
        phase.advance(SyncPhase::Done);

        let result = SyncRunResult {
            dry_run: false,
            phase: phase.current(),
            files: outcomes.into_values().collect(),
            orphans,
            index_files: index.files.len(),
            index_written,
        };
        log_summary(&result);
        Ok(result)
    }

    /// Dry-run result: same counts a real run would produce, no writes.
    fn preview(
        &self,
        manifest: &Manifest,
        changes: &ChangeSet,
        live: &BTreeSet<RelativePath>,
        options: &SyncOptions,
    ) -> Result<SyncRunResult> {
        let mut files: Vec<FileOutcome> = changes
            .unchanged
            .iter()
            .map(|source| self.unchanged_outcome(manifest, source))
            .chain(changes.pending.iter().map(|(source, classification)| FileOutcome {
                key: source.key().clone(),
                classification: *classification,
                output: self.output_for(source.key()),
                status: FileStatus::Pending,
            }))
            .collect();
        files.sort_by(|a, b| a.key.cmp(&b.key));

        let pending_outputs: BTreeSet<RelativePath> = changes
            .pending
            .iter()
            .map(|(source, _)| self.output_for(source.key()))
            .collect();
        let orphans = OrphanCollector::new(self.layout.artifact_root(), self.layout.index_file())
            .preview(manifest, live, &pending_outputs, options.no_clean)?;

        let text_extensions = self.config.text_extension_set();
        let index_files = IndexBuilder::new(
            self.layout.artifact_root(),
            &text_extensions,
            self.layout.index_file(),
            &self.config.project_name,
        )
        .scan()?
        .len();

        let result = SyncRunResult {
            dry_run: true,
            phase: SyncPhase::Previewing,
            files,
            orphans,
            index_files,
            index_written: false,
        };
        log_summary(&result);
        Ok(result)
    }

    /// Queue pending sources in key order, flagging output collisions.
    ///
    /// Outputs of unchanged sources are claimed first; among pending
    /// sources the first key wins. A file at an output path that no
    /// successful entry produced belongs to the user and is only
    /// overwritten when `force` is set.
    fn jobs<'a>(&self, manifest: &Manifest, changes: &'a ChangeSet, force: bool) -> Vec<Job<'a>> {
        let mut claimed: BTreeMap<RelativePath, RelativePath> = changes
            .unchanged
            .iter()
            .filter_map(|source| {
                manifest
                    .get(source.key())
                    .map(|entry| (entry.output.clone(), source.key().clone()))
            })
            .collect();
        let produced: BTreeSet<&RelativePath> = manifest
            .entries()
            .filter(|(_, entry)| entry.is_success())
            .map(|(_, entry)| &entry.output)
            .collect();

        changes
            .pending
            .iter()
            .map(|(source, classification)| {
                let output = self.output_for(source.key());
                let conflict = match claimed.get(&output).filter(|owner| *owner != source.key()) {
                    Some(owner) => {
                        tracing::warn!(key = %source.key(), %output, %owner, "Output collision");
                        Some(Conflict::Claimed { owner: owner.clone() })
                    }
                    None if !force
                        && !produced.contains(&output)
                        && output.to_native(self.layout.artifact_root()).exists() =>
                    {
                        tracing::warn!(key = %source.key(), %output, "Output exists and is not tracked");
                        Some(Conflict::Untracked)
                    }
                    None => {
                        claimed.insert(output.clone(), source.key().clone());
                        None
                    }
                };
                Job {
                    source,
                    classification: *classification,
                    output,
                    conflict,
                }
            })
            .collect()
    }

    fn unchanged_outcome(&self, manifest: &Manifest, source: &SourceFile) -> FileOutcome {
        let output = manifest
            .get(source.key())
            .map(|entry| entry.output.clone())
            .unwrap_or_else(|| self.output_for(source.key()));
        FileOutcome {
            key: source.key().clone(),
            classification: Classification::Unchanged,
            output,
            status: FileStatus::Unchanged,
        }
    }

    /// Artifact path for a source key: same relative path, artifact
    /// extension.
    pub fn output_for(&self, key: &RelativePath) -> RelativePath {
        key.with_extension(&self.config.artifact_extension)
    }

    /// The artifact tree must never be discovered as sources, even when it
    /// is nested inside the source tree.
    fn discovery_exclusions(&self) -> Vec<PathBuf> {
        vec![self.layout.artifact_root().to_path_buf()]
    }

    fn ensure_artifact_root(&self) -> Result<()> {
        let root = self.layout.artifact_root();
        fs::create_dir_all(root).map_err(|e| Error::artifact_directory(root, e))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

fn log_summary(result: &SyncRunResult) {
    let summary = result.summary();
    tracing::info!(
        dry_run = result.dry_run,
        new = summary.new,
        modified = summary.modified,
        unchanged = summary.unchanged,
        failed = summary.failed,
        orphans_removed = summary.orphans_removed,
        orphans_skipped = summary.orphans_skipped,
        "Sync finished"
    );
}
