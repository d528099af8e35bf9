//! Conversion of one source file into one artifact
//!
//! The engine only knows the [`Converter`] trait. It supplies the output
//! path, creates its parent directory, and treats any non-success outcome
//! the same way.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::config::ConverterConfig;
use crate::manifest::EntryStatus;

/// Result of a single conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub status: EntryStatus,
    pub error: Option<String>,
}

impl ConversionOutcome {
    pub fn success() -> Self {
        Self {
            status: EntryStatus::Success,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: EntryStatus::Failed,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }
}

/// Turns a source file into an artifact at a given path.
///
/// Implementations must be shareable across worker threads.
pub trait Converter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Convert `source` and write the result to `output`.
    fn process(&self, source: &Path, output: &Path) -> ConversionOutcome;
}

/// Build the converter described by a project config.
pub fn from_config(config: &ConverterConfig) -> Box<dyn Converter> {
    match config {
        ConverterConfig::Copy => Box::new(CopyConverter),
        ConverterConfig::Command { program, args } => {
            Box::new(CommandConverter::new(program.clone(), args.clone()))
        }
    }
}

/// Copies source bytes to the output path unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyConverter;

impl Converter for CopyConverter {
    fn name(&self) -> &str {
        "copy"
    }

    fn process(&self, source: &Path, output: &Path) -> ConversionOutcome {
        match std::fs::copy(source, output) {
            Ok(_) => ConversionOutcome::success(),
            Err(e) => ConversionOutcome::failed(format!("copy failed: {e}")),
        }
    }
}

/// Runs an external program per file.
///
/// `{input}` and `{output}` inside each argument are replaced with the
/// native source and destination paths.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, source: &Path, output: &Path) -> Vec<String> {
        let input = source.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    fn process(&self, source: &Path, output: &Path) -> ConversionOutcome {
        let args = self.expand_args(source, output);
        tracing::debug!(program = %self.program, ?args, "Running converter");

        let result = Command::new(&self.program).args(&args).output();
        match result {
            Ok(out) if out.status.success() => ConversionOutcome::success(),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                let code = out.status.code().unwrap_or(-1);
                if stderr.is_empty() {
                    ConversionOutcome::failed(format!("{} exited with code {}", self.program, code))
                } else {
                    ConversionOutcome::failed(format!(
                        "{} exited with code {}: {}",
                        self.program, code, stderr
                    ))
                }
            }
            Err(e) => ConversionOutcome::failed(format!("failed to run {}: {}", self.program, e)),
        }
    }
}
