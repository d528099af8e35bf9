//! Filesystem primitives for the mirror sync engine
//!
//! Provides canonical relative paths, content fingerprints, atomic writes,
//! the advisory run lock and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use checksum::{compute_content_checksum, compute_file_checksum};
pub use config::ConfigStore;
pub use constants::MirrorPath;
pub use error::{Error, Result};
pub use lock::RunLock;
pub use path::{RelativePath, normalize_extension};
