//! Converter double that records every invocation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mirror_core::{ConversionOutcome, Converter};
use mirror_fs::RelativePath;

/// Writes `converted:<source content>` to the output, except for keys
/// configured to fail. Clones share the call log.
#[derive(Debug, Clone)]
pub struct ScriptedConverter {
    source_root: PathBuf,
    failing: Arc<BTreeSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConverter {
    /// A converter for sources under `source_root` that always succeeds.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            failing: Arc::new(BTreeSet::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make conversions of the given source keys fail.
    pub fn failing_on(mut self, keys: &[&str]) -> Self {
        self.failing = Arc::new(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Source keys submitted so far, in submission order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn boxed(&self) -> Box<dyn Converter> {
        Box::new(self.clone())
    }

    fn key_of(&self, source: &Path) -> String {
        RelativePath::from_path(&self.source_root, source)
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|_| source.display().to_string())
    }
}

impl Converter for ScriptedConverter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn process(&self, source: &Path, output: &Path) -> ConversionOutcome {
        let key = self.key_of(source);
        self.calls.lock().unwrap().push(key.clone());

        if self.failing.contains(&key) {
            return ConversionOutcome::failed(format!("scripted failure for {key}"));
        }

        let content = match std::fs::read(source) {
            Ok(content) => content,
            Err(e) => return ConversionOutcome::failed(e.to_string()),
        };
        let mut converted = b"converted:".to_vec();
        converted.extend_from_slice(&content);
        match std::fs::write(output, converted) {
            Ok(()) => ConversionOutcome::success(),
            Err(e) => ConversionOutcome::failed(e.to_string()),
        }
    }
}
