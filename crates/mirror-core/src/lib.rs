//! Incremental synchronization and manifest state engine
//!
//! Keeps a derived-artifact directory in sync with a source directory using
//! content fingerprints. The pieces, leaf first:
//!
//! - **discover**: deterministic enumeration of source files
//! - **classify**: new / modified / unchanged against the manifest
//! - **manifest**: the persisted state and its atomic store
//! - **converter**: pluggable source-to-artifact conversion
//! - **orphan**: removal of artifacts whose source is gone, never touching
//!   files the manifest does not track
//! - **index**: flat listing of every text-like artifact
//! - **sync**: the run driver and its result types
//!
//! # Architecture
//!
//! ```text
//!                 mirror-cli
//!                     |
//!                mirror-core
//!                     |
//!                 mirror-fs
//! ```

pub mod classify;
pub mod config;
pub mod converter;
pub mod discover;
pub mod error;
pub mod index;
pub mod manifest;
pub mod orphan;
pub mod sync;

pub use classify::{ChangeSet, Classification, classify};
pub use config::{ConverterConfig, ProjectConfig, ProjectLayout};
pub use converter::{CommandConverter, ConversionOutcome, Converter, CopyConverter};
pub use discover::{SourceFile, discover};
pub use error::{Error, Result};
pub use index::{Index, IndexBuilder};
pub use manifest::{EntryStatus, Manifest, ManifestEntry, ManifestStore};
pub use orphan::{OrphanAction, OrphanCandidate, OrphanCollector, OrphanOutcome, OrphanReport};
pub use sync::{
    CancelToken, ErrorMode, FileOutcome, FileStatus, SyncEngine, SyncOptions, SyncPhase,
    SyncRunResult, SyncSummary,
};
