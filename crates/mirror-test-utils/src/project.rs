//! [`TestProject`] builder for sync scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mirror_core::{Manifest, ManifestStore, ProjectConfig, SyncEngine};

use crate::ScriptedConverter;

/// A temporary, initialized mirror project.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.write_source("docs/a.pdf", "alpha");
/// let converter = project.converter();
/// let result = project.engine(&converter).run(&Default::default()).unwrap();
/// assert_eq!(result.new_count(), 1);
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    config: ProjectConfig,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Initialized project with default configuration, named "test-project".
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Initialized project after applying `configure` to the defaults.
    pub fn with_config(configure: impl FnOnce(&mut ProjectConfig)) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::for_root(temp_dir.path());
        config.project_name = "test-project".to_string();
        configure(&mut config);

        let project = Self { temp_dir, config };
        SyncEngine::with_config(project.root(), project.config.clone())
            .unwrap()
            .init(false)
            .unwrap();
        project
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn source_root(&self) -> PathBuf {
        self.root().join(&self.config.source_dir)
    }

    pub fn artifact_root(&self) -> PathBuf {
        self.root().join(&self.config.artifact_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join(".mirror").join("manifest.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.artifact_root().join(&self.config.index_file)
    }

    /// Scripted converter bound to this project's source root.
    pub fn converter(&self) -> ScriptedConverter {
        ScriptedConverter::new(self.source_root())
    }

    /// Engine using this project's config and the given converter.
    pub fn engine(&self, converter: &ScriptedConverter) -> SyncEngine {
        SyncEngine::with_config(self.root(), self.config.clone())
            .unwrap()
            .with_converter(converter.boxed())
    }

    pub fn write_source(&self, key: &str, content: &str) {
        write(&self.source_root().join(key), content);
    }

    pub fn remove_source(&self, key: &str) {
        fs::remove_file(self.source_root().join(key)).unwrap();
    }

    /// Place a file directly in the artifact tree, as a user would.
    pub fn write_artifact(&self, key: &str, content: &str) {
        write(&self.artifact_root().join(key), content);
    }

    pub fn artifact_exists(&self, key: &str) -> bool {
        self.artifact_root().join(key).is_file()
    }

    pub fn read_artifact(&self, key: &str) -> String {
        fs::read_to_string(self.artifact_root().join(key)).unwrap()
    }

    pub fn manifest(&self) -> Manifest {
        ManifestStore::new(self.manifest_path()).load().unwrap()
    }

    pub fn manifest_bytes(&self) -> Vec<u8> {
        fs::read(self.manifest_path()).unwrap()
    }

    /// Every file under the artifact root with its bytes, keyed by
    /// forward-slash relative path.
    pub fn artifact_tree(&self) -> BTreeMap<String, Vec<u8>> {
        let mut tree = BTreeMap::new();
        collect(&self.artifact_root(), &self.artifact_root(), &mut tree);
        tree
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn collect(root: &Path, dir: &Path, tree: &mut BTreeMap<String, Vec<u8>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, tree);
        } else {
            let key = path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            tree.insert(key, fs::read(&path).unwrap());
        }
    }
}
