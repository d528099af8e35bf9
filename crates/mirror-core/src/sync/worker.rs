//! Conversion worker pool
//!
//! Jobs are fed through a channel to scoped worker threads. Results flow
//! back over a second channel to the caller, which is the only place they
//! are merged, and they are keyed by source path so completion order never
//! leaks into the outcome.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::Utc;
use crossbeam_channel::unbounded;

use mirror_fs::RelativePath;

use super::{CancelToken, ErrorMode, FileOutcome, FileStatus};
use crate::classify::Classification;
use crate::converter::{ConversionOutcome, Converter};
use crate::discover::SourceFile;
use crate::manifest::ManifestEntry;
use crate::{Error, Result};

/// One source queued for conversion
#[derive(Debug)]
pub(crate) struct Job<'a> {
    pub source: &'a SourceFile,
    pub classification: Classification,
    pub output: RelativePath,
    pub conflict: Option<Conflict>,
}

/// Why a job must not write its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Conflict {
    /// Another source already owns the output
    Claimed { owner: RelativePath },
    /// A file no successful entry produced sits at the output path
    Untracked,
}

/// A finished attempt: the entry to stage and the outcome to report
#[derive(Debug)]
pub(crate) struct Processed {
    pub entry: ManifestEntry,
    pub outcome: FileOutcome,
}

pub(crate) struct WorkerPool<'a> {
    pub converter: &'a dyn Converter,
    pub artifact_root: &'a Path,
    pub error_mode: ErrorMode,
    pub workers: usize,
    pub cancel: &'a CancelToken,
}

impl WorkerPool<'_> {
    /// Process every job.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the token fired during processing
    /// - [`Error::ProcessingAborted`] for the first failure (in key order)
    ///   when running fail-fast
    /// - any fatal error raised while preparing an artifact directory
    pub fn run(&self, jobs: Vec<Job<'_>>) -> Result<BTreeMap<RelativePath, Processed>> {
        let workers = self.workers.clamp(1, jobs.len().max(1));
        let (job_tx, job_rx) = unbounded();
        for job in jobs {
            // Unbounded, and `job_rx` is held here, so a send cannot fail.
            let sent = job_tx.send(job);
            debug_assert!(sent.is_ok());
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded();
        let abort = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let abort = &abort;
                scope.spawn(move || {
                    while !abort.load(Ordering::SeqCst) && !self.cancel.is_cancelled() {
                        let Ok(job) = job_rx.recv() else {
                            break;
                        };
                        let key = job.source.key().clone();
                        let result = self.process_one(&job);
                        let stop = match &result {
                            Err(_) => true,
                            Ok(processed) => {
                                processed.outcome.is_failed() && self.error_mode == ErrorMode::Fail
                            }
                        };
                        if stop {
                            abort.store(true, Ordering::SeqCst);
                        }
                        if result_tx.send((key, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut processed = BTreeMap::new();
        let mut fatal: BTreeMap<RelativePath, Error> = BTreeMap::new();
        for (key, result) in result_rx.iter() {
            match result {
                Ok(done) => {
                    processed.insert(key, done);
                }
                Err(e) => {
                    fatal.insert(key, e);
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some((_, error)) = fatal.into_iter().next() {
            return Err(error);
        }
        if self.error_mode == ErrorMode::Fail
            && let Some((key, done)) = processed.iter().find(|(_, p)| p.outcome.is_failed())
        {
            let message = done.entry.error.clone().unwrap_or_default();
            return Err(Error::ProcessingAborted {
                key: key.clone(),
                message,
            });
        }

        Ok(processed)
    }

    fn process_one(&self, job: &Job<'_>) -> Result<Processed> {
        let key = job.source.key();
        tracing::debug!(key = %key, output = %job.output, "Processing");

        let fingerprint = match job.source.fingerprint() {
            Ok(fingerprint) => fingerprint.to_string(),
            Err(e) => return Ok(self.finish(job, String::new(), ConversionOutcome::failed(e.to_string()))),
        };

        if let Some(conflict) = &job.conflict {
            let message = match conflict {
                Conflict::Claimed { owner } => {
                    format!("output {} is already produced from {}", job.output, owner)
                }
                Conflict::Untracked => format!(
                    "output {} exists but is not tracked; move it away or sync with --force",
                    job.output
                ),
            };
            return Ok(self.finish(job, fingerprint, ConversionOutcome::failed(message)));
        }

        let output_path = job.output.to_native(self.artifact_root);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::artifact_directory(parent, e))?;
        }

        let mut outcome = self.converter.process(job.source.path(), &output_path);
        if outcome.is_success() && !output_path.is_file() {
            outcome = ConversionOutcome::failed(format!(
                "{} reported success but produced no output",
                self.converter.name()
            ));
        }

        Ok(self.finish(job, fingerprint, outcome))
    }

    fn finish(&self, job: &Job<'_>, fingerprint: String, outcome: ConversionOutcome) -> Processed {
        let key = job.source.key().clone();
        let now = Utc::now();

        let (entry, status) = if outcome.is_success() {
            tracing::info!(key = %key, output = %job.output, "Converted");
            (
                ManifestEntry::success(fingerprint, job.output.clone(), now),
                FileStatus::Converted,
            )
        } else {
            let error = outcome
                .error
                .unwrap_or_else(|| "conversion failed".to_string());
            tracing::warn!(key = %key, %error, "Conversion failed");
            (
                ManifestEntry::failed(fingerprint, job.output.clone(), now, error.clone()),
                FileStatus::Failed { error },
            )
        };

        Processed {
            entry,
            outcome: FileOutcome {
                key,
                classification: job.classification,
                output: job.output.clone(),
                status,
            },
        }
    }
}
