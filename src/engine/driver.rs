// src/engine/driver.rs

//! Walks an ordered target list, skipping fresh targets and compiling the rest.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::dag::graph::{TargetId, TargetRegistry};
use crate::dag::key::TargetKey;
use crate::engine::metadata::ObjectMetadata;
use crate::engine::staleness::StalenessTracker;
use crate::errors::{BuildError, Result};
use crate::exec::{CompileOutcome, Compiler};
use crate::fs::SourceStore;

/// Sequence the driver walks targets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildOrdering {
    /// As declared in the build spec.
    #[default]
    Declaration,
    /// Dependencies before dependents.
    Dependencies,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: Vec<TargetKey>,
    pub skipped: Vec<TargetKey>,
}

/// Sequential build loop over a scanned registry.
///
/// With `diff` off every target in the order is compiled. With `diff` on,
/// fresh targets are skipped and a stale target that others depend on
/// first marks those dependents stale.
pub struct BuildDriver<'a, C: Compiler, M: ObjectMetadata> {
    registry: &'a TargetRegistry,
    sources: Arc<dyn SourceStore>,
    base_dir: PathBuf,
    metadata: M,
    compiler: C,
    diff: bool,
    dry_run: bool,
}

impl<'a, C: Compiler, M: ObjectMetadata> BuildDriver<'a, C, M> {
    pub fn new(
        registry: &'a TargetRegistry,
        sources: Arc<dyn SourceStore>,
        base_dir: &Path,
        metadata: M,
        compiler: C,
    ) -> Self {
        Self {
            registry,
            sources,
            base_dir: base_dir.to_path_buf(),
            metadata,
            compiler,
            diff: false,
            dry_run: false,
        }
    }

    pub fn with_diff(mut self, diff: bool) -> Self {
        self.diff = diff;
        self
    }

    /// Keep invalidation in memory and record no build stamps.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Build `order`, stopping at the first failure.
    pub async fn run(&mut self, order: &[TargetId]) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();
        let total = order.len();

        if self.diff {
            for &id in order {
                let node = self.registry.node(id);
                node.set_timestamps(self.metadata.refresh(node)?);
            }
        }

        let mut tracker = StalenessTracker::new(self.registry, self.sources.as_ref(), &self.base_dir);
        if self.dry_run {
            tracker = tracker.in_memory();
        }

        for (position, &id) in order.iter().enumerate() {
            let node = self.registry.node(id);

            if self.diff {
                if !tracker.needs_rebuild(id) {
                    info!(key = %node.key(), "up to date, skipping");
                    summary.skipped.push(node.key().clone());
                    continue;
                }
                if node.is_child() {
                    tracker.invalidate_dependents(id);
                }
            }

            info!(
                key = %node.key(),
                "building {} of {}",
                position + 1,
                total
            );

            match self.compiler.compile(node).await? {
                CompileOutcome::Success => {
                    if !self.dry_run {
                        let built_at = SystemTime::now();
                        self.metadata.record_build(node, built_at)?;
                        node.update_timestamps(|ts| ts.last_object_build = Some(built_at));
                    }
                    debug!(key = %node.key(), "build succeeded");
                    summary.built.push(node.key().clone());
                }
                CompileOutcome::Failed(code) => {
                    return Err(BuildError::CompilationFailed {
                        target: node.key().to_string(),
                        reason: format!("compile command exited with code {code}"),
                    });
                }
            }
        }

        info!(
            built = summary.built.len(),
            skipped = summary.skipped.len(),
            "build finished"
        );
        Ok(summary)
    }
}
