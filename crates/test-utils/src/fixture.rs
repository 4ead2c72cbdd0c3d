#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use objdag::config::BuildSpec;
use objdag::dag::TargetRegistry;
use objdag::errors::Result;
use objdag::fs::{MockFileSystem, SourceStore};
use objdag::scan::{DependencyScanner, OverrideMap, ScanReport};

use crate::builders::BASE_DIR;

/// A spec, its registry and an in-memory source tree rooted at
/// [`BASE_DIR`].
pub struct Fixture {
    pub fs: MockFileSystem,
    pub spec: BuildSpec,
    pub registry: Arc<TargetRegistry>,
}

impl Fixture {
    pub fn new(spec: BuildSpec) -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir(BASE_DIR);
        let registry = Arc::new(TargetRegistry::from_spec(&spec));
        Self { fs, spec, registry }
    }

    /// Add a source file relative to [`BASE_DIR`].
    pub fn source(self, rel: &str, content: &str) -> Self {
        self.fs.add_file(Self::path(rel), content);
        self
    }

    pub fn path(rel: &str) -> PathBuf {
        Path::new(BASE_DIR).join(rel)
    }

    pub fn sources(&self) -> Arc<dyn SourceStore> {
        Arc::new(self.fs.clone())
    }

    pub fn scanner(&self) -> DependencyScanner {
        DependencyScanner::new(
            Arc::clone(&self.registry),
            self.sources(),
            self.spec.base_dir.clone(),
        )
        .with_overrides(OverrideMap::from_spec(&self.spec))
    }

    pub async fn scan(&self) -> Result<ScanReport> {
        self.scanner().scan().await
    }

    /// Keys of the dependencies of `key`, sorted.
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        let node = self.node(key);
        let mut keys: Vec<String> = node
            .children()
            .into_iter()
            .map(|id| self.registry.node(id).key().to_string())
            .collect();
        keys.sort();
        keys
    }

    /// Keys of the targets depending on `key`, sorted.
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        let node = self.node(key);
        let mut keys: Vec<String> = node
            .fathers()
            .into_iter()
            .map(|id| self.registry.node(id).key().to_string())
            .collect();
        keys.sort();
        keys
    }

    pub fn node(&self, key: &str) -> &objdag::dag::TargetNode {
        let key = key.parse().expect("valid target key");
        self.registry
            .node_by_key(&key)
            .expect("target declared in fixture spec")
    }
}
