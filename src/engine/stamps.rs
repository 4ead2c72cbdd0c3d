// src/engine/stamps.rs

//! Persistent record of when each target was last built successfully.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::dag::key::TargetKey;

/// Path of the stamp file relative to the base directory:
///
/// `<base>/.objdag/stamps`
pub const STAMP_FILE_PATH: &str = ".objdag/stamps";

fn stamp_file_path(root: &Path) -> PathBuf {
    root.join(STAMP_FILE_PATH)
}

/// Abstract storage for build stamps.
pub trait StampStore: Send + Sync {
    fn load(&self, key: &TargetKey) -> Result<Option<SystemTime>>;
    fn save(&mut self, key: &TargetKey, built_at: SystemTime) -> Result<()>;
}

/// Stores stamps in `<base>/.objdag/stamps`, one `KEY<TAB>unix-millis`
/// line per target.
#[derive(Debug, Clone)]
pub struct FileStampStore {
    root: PathBuf,
}

impl FileStampStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl StampStore for FileStampStore {
    fn load(&self, key: &TargetKey) -> Result<Option<SystemTime>> {
        let map = load_all_stamps(&self.root)?;
        Ok(map.get(&key.to_string()).copied())
    }

    fn save(&mut self, key: &TargetKey, built_at: SystemTime) -> Result<()> {
        let mut map = load_all_stamps(&self.root)?;
        map.insert(key.to_string(), built_at);
        save_all_stamps(&self.root, &map)?;
        debug!(key = %key, "stored build stamp (file)");
        Ok(())
    }
}

/// Stores stamps in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStampStore {
    map: BTreeMap<String, SystemTime>,
}

impl MemoryStampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StampStore for MemoryStampStore {
    fn load(&self, key: &TargetKey) -> Result<Option<SystemTime>> {
        Ok(self.map.get(&key.to_string()).copied())
    }

    fn save(&mut self, key: &TargetKey, built_at: SystemTime) -> Result<()> {
        self.map.insert(key.to_string(), built_at);
        debug!(key = %key, "stored build stamp (memory)");
        Ok(())
    }
}

/// Whole milliseconds since the epoch, rounded up so a stored stamp is never
/// earlier than the instant it records.
fn to_millis(at: SystemTime) -> u128 {
    let since = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let millis = since.as_millis();
    if since.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

fn from_millis(millis: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis)
}

fn load_all_stamps(root: &Path) -> Result<BTreeMap<String, SystemTime>> {
    let path = stamp_file_path(root);

    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let file = File::open(&path).with_context(|| format!("opening stamp file at {:?}", path))?;
    let reader = BufReader::new(file);

    let mut map = BTreeMap::new();

    for line_res in reader.lines() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed = trimmed
            .split_once('\t')
            .and_then(|(key, millis)| Some((key, millis.trim().parse::<u64>().ok()?)));
        match parsed {
            Some((key, millis)) => {
                map.insert(key.to_string(), from_millis(millis));
            }
            None => warn!(line = %trimmed, "ignoring malformed stamp line"),
        }
    }

    Ok(map)
}

fn save_all_stamps(root: &Path, map: &BTreeMap<String, SystemTime>) -> Result<()> {
    let path = stamp_file_path(root);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating stamp directory at {:?}", parent))?;
    }

    let file = File::create(&path).with_context(|| format!("creating stamp file at {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for (key, built_at) in map.iter() {
        writeln!(writer, "{}\t{}", key, to_millis(*built_at))?;
    }

    writer.flush()?;
    Ok(())
}
