// src/dag/location.rs

//! Where a target's source text lives.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::dag::key::TargetKey;

/// Source address of a target. Stream and member locations are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Path-addressed stream file, as declared (possibly relative).
    Stream(PathBuf),
    /// Library/file/member address of a source physical file member.
    Member {
        library: String,
        file: String,
        member: String,
    },
}

impl SourceLocation {
    /// Derive the location from a target's effective compile parameters.
    ///
    /// `SRCSTMF` wins; otherwise an explicit `SRCFILE` or `SRCMBR` selects a
    /// member, defaulting the missing parts from the key.
    pub fn from_params(key: &TargetKey, params: &BTreeMap<String, String>) -> Option<Self> {
        if let Some(stmf) = params.get("SRCSTMF").map(|v| unquote(v)) {
            if !stmf.is_empty() {
                return Some(SourceLocation::Stream(PathBuf::from(stmf)));
            }
        }

        let srcfile = params.get("SRCFILE").map(|v| unquote(v).to_uppercase());
        let srcmbr = params.get("SRCMBR").map(|v| unquote(v).to_uppercase());
        if srcfile.is_none() && srcmbr.is_none() {
            return None;
        }

        let (library, file) = match srcfile.as_deref().and_then(|f| f.split_once('/')) {
            Some((lib, file)) if !lib.starts_with('*') => (lib.to_string(), file.to_string()),
            Some((_, file)) => (key.library().to_string(), file.to_string()),
            None => (
                key.library().to_string(),
                srcfile.unwrap_or_else(|| {
                    key.source_type()
                        .default_source_file(key.object_type())
                        .to_string()
                }),
            ),
        };
        let member = srcmbr
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| key.object_name().to_string());

        Some(SourceLocation::Member {
            library,
            file,
            member,
        })
    }

    /// Absolute path used to read or touch this source.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        match self {
            SourceLocation::Stream(path) if path.is_absolute() => path.clone(),
            SourceLocation::Stream(path) => base_dir.join(path),
            SourceLocation::Member {
                library,
                file,
                member,
            } => PathBuf::from(format!(
                "/QSYS.LIB/{library}.LIB/{file}.FILE/{member}.MBR"
            )),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Stream(path) => write!(f, "{}", path.display()),
            SourceLocation::Member {
                library,
                file,
                member,
            } => write!(f, "{library}/{file}({member})"),
        }
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('\'').trim()
}
