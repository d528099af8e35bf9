//! Index generation
//!
//! The index lists every text-like file currently in the artifact tree,
//! whether it was produced by a converter or added by hand. It is built
//! from the filesystem, never from the manifest.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use walkdir::WalkDir;

use mirror_fs::{RelativePath, io};

use crate::{Error, Result};

/// A rendered index: header metadata plus the sorted listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<RelativePath>,
}

impl Index {
    /// Render the index file content.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {} index\n", self.project_name));
        out.push_str(&format!(
            "# Generated: {}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!("# Files: {}\n", self.files.len()));
        out.push('\n');
        for file in &self.files {
            out.push_str(file.as_str());
            out.push('\n');
        }
        out
    }

    fn listing(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.as_str()).collect()
    }
}

/// Listing part of a rendered index: every non-empty line after the
/// header block.
fn parse_listing(content: &str) -> Option<Vec<&str>> {
    let (_, body) = content.split_once("\n\n")?;
    Some(body.lines().filter(|line| !line.is_empty()).collect())
}

/// Builds the index for one artifact root.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder<'a> {
    artifact_root: &'a Path,
    text_extensions: &'a BTreeSet<String>,
    index_file: &'a str,
    project_name: &'a str,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        artifact_root: &'a Path,
        text_extensions: &'a BTreeSet<String>,
        index_file: &'a str,
        project_name: &'a str,
    ) -> Self {
        Self {
            artifact_root,
            text_extensions,
            index_file,
            project_name,
        }
    }

    /// Eligible artifact files, sorted case-insensitively.
    ///
    /// Hidden entries and the index file itself are excluded. Ties between
    /// names differing only in case are broken by exact byte order so the
    /// result is fully deterministic.
    pub fn scan(&self) -> Result<Vec<RelativePath>> {
        let mut files = Vec::new();
        if !self.artifact_root.exists() {
            return Ok(files);
        }

        let walker = WalkDir::new(self.artifact_root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with('.'))
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.artifact_root).to_path_buf();
                Error::artifact_directory(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(key) = RelativePath::from_path(self.artifact_root, entry.path()) else {
                continue;
            };
            if key.as_str() == self.index_file || !key.has_extension_in(self.text_extensions) {
                continue;
            }
            files.push(key);
        }

        files.sort_by(|a, b| {
            a.as_str()
                .to_lowercase()
                .cmp(&b.as_str().to_lowercase())
                .then_with(|| a.cmp(b))
        });
        Ok(files)
    }

    /// Scan and assemble the index with the given timestamp.
    pub fn build(&self, generated_at: DateTime<Utc>) -> Result<Index> {
        Ok(Index {
            project_name: self.project_name.to_string(),
            generated_at,
            files: self.scan()?,
        })
    }

    /// Write the index unless the existing file already has the same
    /// listing. Returns the index and whether the file was written.
    pub fn write(&self, generated_at: DateTime<Utc>) -> Result<(Index, bool)> {
        let index = self.build(generated_at)?;
        let path = self.artifact_root.join(self.index_file);

        if let Ok(existing) = std::fs::read_to_string(&path)
            && existing.starts_with(&format!("# {} index\n", self.project_name))
            && parse_listing(&existing).as_deref() == Some(index.listing().as_slice())
        {
            tracing::debug!(path = %path.display(), "Index unchanged");
            return Ok((index, false));
        }

        io::write_text(&path, &index.render())?;
        tracing::info!(path = %path.display(), files = index.files.len(), "Wrote index");
        Ok((index, true))
    }
}
