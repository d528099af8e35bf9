//! Reserved names used inside a mirror project.

use std::path::Path;

/// Well-known files and directories of a mirror project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPath {
    /// The `.mirror` state directory at the project root
    StateDir,
    /// `config.toml` inside the state directory
    ConfigFile,
    /// `manifest.json` inside the state directory
    ManifestFile,
    /// `sync.lock` inside the state directory
    LockFile,
    /// Default name of the generated index inside the artifact root
    IndexFile,
}

impl MirrorPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateDir => ".mirror",
            Self::ConfigFile => "config.toml",
            Self::ManifestFile => "manifest.json",
            Self::LockFile => "sync.lock",
            Self::IndexFile => "_index.txt",
        }
    }
}

impl AsRef<Path> for MirrorPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MirrorPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MirrorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
