//! Format-agnostic configuration loading and saving

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and handles
/// serialization/deserialization transparently.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Parse already-read content using the format implied by `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &Path, content: &str) -> Result<T> {
        match extension_of(path).as_str() {
            "toml" => toml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: e.to_string(),
            }),
            "json" => serde_json::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Save configuration to a file.
    ///
    /// Format is determined from file extension. Uses atomic write to
    /// prevent corruption.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let content = match extension_of(path).as_str() {
            "toml" => toml::to_string_pretty(value).map_err(|e| Error::ConfigSerialize {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: e.to_string(),
            })?,
            "json" => {
                let mut json =
                    serde_json::to_string_pretty(value).map_err(|e| Error::ConfigSerialize {
                        path: path.to_path_buf(),
                        format: "JSON".into(),
                        message: e.to_string(),
                    })?;
                json.push('\n');
                json
            }
            other => {
                return Err(Error::UnsupportedFormat {
                    extension: other.to_string(),
                });
            }
        };

        io::write_atomic(path, content.as_bytes())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
