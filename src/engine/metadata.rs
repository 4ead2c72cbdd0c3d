// src/engine/metadata.rs

//! Where target timestamps come from.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use tracing::debug;

use crate::dag::graph::TargetNode;
use crate::engine::stamps::StampStore;
use crate::engine::staleness::Timestamps;
use crate::fs::SourceStore;

/// Supplies the timestamps of a target and records successful builds.
pub trait ObjectMetadata: Send {
    fn refresh(&self, node: &TargetNode) -> Result<Timestamps>;
    fn record_build(&mut self, node: &TargetNode, built_at: SystemTime) -> Result<()>;
}

/// Metadata derived from local files.
///
/// The source edit time is the modification time of the target's source;
/// the object build time is the last stamp recorded for the target. No
/// stamp means the object was never built here.
pub struct LocalMetadata {
    sources: Arc<dyn SourceStore>,
    stamps: Box<dyn StampStore>,
    base_dir: PathBuf,
}

impl LocalMetadata {
    pub fn new(sources: Arc<dyn SourceStore>, stamps: Box<dyn StampStore>, base_dir: &Path) -> Self {
        Self {
            sources,
            stamps,
            base_dir: base_dir.to_path_buf(),
        }
    }
}

impl ObjectMetadata for LocalMetadata {
    fn refresh(&self, node: &TargetNode) -> Result<Timestamps> {
        let last_source_edit = match node.location() {
            Some(location) => {
                let path = location.resolve(&self.base_dir);
                if self.sources.exists(&path) {
                    Some(self.sources.modified(&path)?)
                } else {
                    None
                }
            }
            None => None,
        };
        let last_object_build = self.stamps.load(node.key())?;

        debug!(
            key = %node.key(),
            ?last_source_edit,
            ?last_object_build,
            "timestamps refreshed"
        );

        Ok(Timestamps::new(last_source_edit, last_object_build))
    }

    fn record_build(&mut self, node: &TargetNode, built_at: SystemTime) -> Result<()> {
        self.stamps.save(node.key(), built_at)
    }
}
