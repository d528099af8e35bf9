//! Error types for mirror-core

use std::path::PathBuf;

use mirror_fs::RelativePath;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a run before the manifest is committed.
///
/// Per-file conversion failures and orphan removal failures are not
/// represented here; they are recoverable and recorded in the run result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persisted manifest could not be parsed or failed validation
    #[error(
        "Manifest at {path} is corrupt: {reason}. Run `mirror init --force` to rebuild sync state"
    )]
    ManifestCorrupt { path: PathBuf, reason: String },

    /// No manifest exists where a sync expects one
    #[error("No manifest found at {path}. Run `mirror init` to initialize the project")]
    ManifestMissing { path: PathBuf },

    /// A manifest already exists and initialization was not forced
    #[error("Project already initialized at {path}. Use --force to reset sync state")]
    AlreadyInitialized { path: PathBuf },

    /// The source directory or a source file could not be read
    #[error("Cannot read source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact directory tree could not be created or written
    #[error("Cannot write artifact directory {path}: {source}")]
    ArtifactDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A conversion failed while running in fail-fast mode
    #[error("Processing {key} failed: {message}. Run aborted, no sync state was saved")]
    ProcessingAborted { key: RelativePath, message: String },

    /// The run was cancelled from outside
    #[error("Sync cancelled. No sync state was saved")]
    Cancelled,

    /// Invalid project configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn source_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn artifact_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArtifactDirectory {
            path: path.into(),
            source,
        }
    }

    /// Whether this error stems from another run holding the project lock.
    pub fn is_lock_held(&self) -> bool {
        matches!(self, Self::Fs(mirror_fs::Error::LockHeld { .. }))
    }
}
