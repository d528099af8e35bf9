//! Sync orchestration
//!
//! This module provides:
//! - **engine**: the run driver tying discovery, classification,
//!   conversion, orphan collection, indexing and commit together
//! - **options**: run flags and the per-file error mode
//! - **report**: the per-run result returned to callers
//! - **phase**: the run state machine
//! - **cancel**: external cancellation

mod cancel;
mod engine;
mod options;
mod phase;
mod report;
mod worker;

pub use cancel::CancelToken;
pub use engine::SyncEngine;
pub use options::{ErrorMode, SyncOptions};
pub use phase::SyncPhase;
pub use report::{FileOutcome, FileStatus, SyncRunResult, SyncSummary};
