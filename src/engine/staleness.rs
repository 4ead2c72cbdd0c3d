// src/engine/staleness.rs

//! Rebuild decisions and cascading invalidation of dependents.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::dag::graph::{TargetId, TargetRegistry};
use crate::fs::SourceStore;

/// Last source edit and last successful object build of one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamps {
    pub last_source_edit: Option<SystemTime>,
    pub last_object_build: Option<SystemTime>,
}

impl Timestamps {
    pub fn new(last_source_edit: Option<SystemTime>, last_object_build: Option<SystemTime>) -> Self {
        Self {
            last_source_edit,
            last_object_build,
        }
    }

    /// Unknown history always means a rebuild; otherwise only an edit
    /// strictly after the last build does.
    pub fn needs_rebuild(&self) -> bool {
        match (self.last_source_edit, self.last_object_build) {
            (Some(edit), Some(build)) => edit > build,
            _ => true,
        }
    }
}

/// Propagates "this dependency changed" to the targets depending on it.
///
/// With a persistent tracker the invalidation is a touch of each father's
/// source, so it survives the process and a later run sees the father as
/// stale. [`StalenessTracker::in_memory`] only advances the in-memory edit
/// time, which is what a dry run wants.
#[derive(Debug)]
pub struct StalenessTracker<'a> {
    registry: &'a TargetRegistry,
    store: &'a dyn SourceStore,
    base_dir: PathBuf,
    persist: bool,
}

impl<'a> StalenessTracker<'a> {
    pub fn new(registry: &'a TargetRegistry, store: &'a dyn SourceStore, base_dir: &Path) -> Self {
        Self {
            registry,
            store,
            base_dir: base_dir.to_path_buf(),
            persist: true,
        }
    }

    pub fn in_memory(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn needs_rebuild(&self, id: TargetId) -> bool {
        self.registry.node(id).needs_rebuild()
    }

    /// Mark every father of `id` stale unless it already is.
    ///
    /// Returns the fathers that were invalidated. Fathers without a source
    /// location are skipped, and a failed touch is logged without aborting.
    pub fn invalidate_dependents(&self, id: TargetId) -> Vec<TargetId> {
        let node = self.registry.node(id);
        let mut invalidated = Vec::new();

        for father_id in node.fathers() {
            let father = self.registry.node(father_id);
            if father.needs_rebuild() {
                debug!(
                    key = %father.key(),
                    dependency = %node.key(),
                    "dependent already needs a rebuild"
                );
                continue;
            }

            let Some(location) = father.location() else {
                warn!(
                    key = %father.key(),
                    "dependent has no source location; cannot mark it stale"
                );
                continue;
            };

            let edited_at = if self.persist {
                let path = location.resolve(&self.base_dir);
                if let Err(err) = self.store.touch(&path) {
                    warn!(
                        key = %father.key(),
                        path = %path.display(),
                        error = %err,
                        "failed to touch dependent source"
                    );
                    continue;
                }
                self.store.modified(&path).unwrap_or_else(|_| SystemTime::now())
            } else {
                SystemTime::now()
            };

            father.update_timestamps(|ts| {
                ts.last_source_edit = Some(match ts.last_object_build {
                    Some(build) if build >= edited_at => build + std::time::Duration::from_millis(1),
                    _ => edited_at,
                });
            });

            info!(
                key = %father.key(),
                dependency = %node.key(),
                "dependency rebuilt; marking dependent stale"
            );
            invalidated.push(father_id);
        }

        invalidated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(MockFileSystem::at(secs))
    }

    #[test]
    fn missing_timestamps_need_rebuild() {
        assert!(Timestamps::default().needs_rebuild());
        assert!(Timestamps::new(at(5), None).needs_rebuild());
        assert!(Timestamps::new(None, at(5)).needs_rebuild());
    }

    #[test]
    fn compares_edit_against_build() {
        assert!(Timestamps::new(at(20), at(10)).needs_rebuild());
        assert!(!Timestamps::new(at(10), at(20)).needs_rebuild());
        assert!(!Timestamps::new(at(10), at(10)).needs_rebuild());
    }
}
