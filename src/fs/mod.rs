// src/fs/mod.rs

//! Source retrieval and modification-time access.

use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

pub use mock::MockFileSystem;

/// Abstract store holding target sources.
///
/// Paths are already resolved (see `SourceLocation::resolve`): stream files
/// and `/QSYS.LIB/...` member paths look the same from here.
pub trait SourceStore: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Last modification time of the source.
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Advance the modification time to now.
    fn touch(&self, path: &Path) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl SourceStore for RealFileSystem {
    /// Invalid UTF-8 (e.g. an EBCDIC-converted `ñ` in a comment) is
    /// replaced rather than failing the whole source.
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("reading source {:?}", path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let meta = fs::metadata(path).with_context(|| format!("reading metadata of {:?}", path))?;
        meta.modified()
            .with_context(|| format!("reading modification time of {:?}", path))
    }

    fn touch(&self, path: &Path) -> Result<()> {
        let file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("opening {:?} for touch", path))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("updating modification time of {:?}", path))
    }
}
