// src/fs/mock.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use anyhow::{anyhow, Result};

use super::SourceStore;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: String, modified: SystemTime },
    Dir,
}

/// In-memory [`SourceStore`] for tests.
///
/// Clones share the same entries, so a test can keep a handle while the
/// scanner or tracker holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.add_dir(".");
        fs
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.lock();
        ensure_dirs(&mut entries, path.as_ref());
    }

    /// Add a file modified "now".
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.add_file_with_mtime(path, content, SystemTime::now());
    }

    pub fn add_file_with_mtime(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
        modified: SystemTime,
    ) {
        let path = path.as_ref();
        let mut entries = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut entries, parent);
        }
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
    }

    /// Modification time `secs` seconds after the Unix epoch, handy for
    /// ordering edits and builds in tests.
    pub fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(dir.to_path_buf())
            .or_insert(MockEntry::Dir);
        current = dir.parent();
    }
}

impl SourceStore for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(path) {
            Some(MockEntry::File { content, .. }) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.lock().get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn touch(&self, path: &Path) -> Result<()> {
        match self.lock().get_mut(path) {
            Some(MockEntry::File { modified, .. }) => {
                // Never move backwards, even when a test planted a future mtime.
                *modified = SystemTime::now().max(*modified + Duration::from_millis(1));
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_advances_mtime() {
        let fs = MockFileSystem::new();
        fs.add_file_with_mtime("/src/a.rpgle", "x", MockFileSystem::at(10));

        fs.touch(Path::new("/src/a.rpgle")).unwrap();
        assert!(fs.modified(Path::new("/src/a.rpgle")).unwrap() > MockFileSystem::at(10));
        assert!(fs.is_dir(Path::new("/src")));
    }

    #[test]
    fn missing_files_are_errors() {
        let fs = MockFileSystem::new();
        assert!(fs.read_to_string(Path::new("/nope")).is_err());
        assert!(fs.touch(Path::new("/nope")).is_err());
        assert!(!fs.exists(Path::new("/nope")));
    }
}
