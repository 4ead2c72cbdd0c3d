// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BuildSpec, RawBuildSpec};
use crate::errors::Result;

/// Load a build spec from `path` and return the raw, unvalidated form.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// key parsing and the other semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBuildSpec> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let spec: RawBuildSpec = toml::from_str(&contents)?;

    Ok(spec)
}

/// Load a build spec from `path`, validate it and anchor its base directory.
///
/// A relative `[build] base_dir` is taken relative to the spec file's
/// directory; a missing one becomes that directory itself.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildSpec> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut spec = BuildSpec::try_from(raw)?;

    let spec_dir = spec_root_dir(path);
    spec.base_dir = Some(match spec.base_dir.take() {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => spec_dir.join(dir),
        None => spec_dir,
    });

    debug!(
        spec = %path.display(),
        base_dir = ?spec.base_dir,
        targets = spec.targets.len(),
        "build spec loaded"
    );
    Ok(spec)
}

/// Default spec path: `Objdag.toml` in the current working directory.
pub fn default_spec_path() -> PathBuf {
    PathBuf::from("Objdag.toml")
}

/// Directory containing the spec file, or `.` for a bare file name.
fn spec_root_dir(spec_path: &Path) -> PathBuf {
    match spec_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
