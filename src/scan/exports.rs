// src/scan/exports.rs

//! Exported-procedure index built before the main scan.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::dag::graph::{TargetId, TargetRegistry};
use crate::dag::key::TargetKey;
use crate::scan::rules::normalize_procedure_name;
use crate::types::{CompilationKind, ObjectType};

/// Free-form procedure header up to its terminating semicolon.
static DCL_PROC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bDCL-PROC\s+([A-Z0-9$#@_]+)([^;]*);").expect("valid DCL-PROC pattern")
});

/// Fixed-form P-spec: `P` in column 6, name in 7-21, `B` in 24, `EXPORT`
/// in the keyword area.
static FIXED_P_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^.{5}P(.{15}).{2}B.*\bEXPORT\b").expect("valid P-spec pattern")
});

static EXPORT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bEXPORT\b").expect("valid EXPORT pattern"));

/// Whether a target can export procedures for others to bind to.
pub fn exports_procedures(key: &TargetKey) -> bool {
    key.object_type() == ObjectType::Module
        && matches!(
            key.compilation_kind(),
            CompilationKind::CrtRpgMod | CompilationKind::CrtSqlRpgi
        )
}

/// Names of the procedures a module source exports, normalized.
pub fn exported_procedures(source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for caps in DCL_PROC.captures_iter(source) {
        let keywords = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if !EXPORT_KEYWORD.is_match(keywords) {
            continue;
        }
        if let Some(name) = caps.get(1).and_then(|m| normalize_procedure_name(m.as_str())) {
            names.insert(name);
        }
    }

    for line in source.lines() {
        if let Some(name) = FIXED_P_SPEC
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| normalize_procedure_name(m.as_str()))
        {
            names.insert(name);
        }
    }

    names
}

/// Exported procedure name to owning module target.
///
/// Filled once by a single thread after the pre-pass joins, then only read.
#[derive(Debug, Clone, Default)]
pub struct ExportIndex {
    owners: HashMap<String, TargetId>,
}

impl ExportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the exports of `module`. An already indexed name keeps its
    /// first owner.
    pub fn insert_all(
        &mut self,
        registry: &TargetRegistry,
        module: TargetId,
        names: impl IntoIterator<Item = String>,
    ) {
        for name in names {
            match self.owners.get(&name) {
                Some(&first) if first != module => warn!(
                    procedure = %name,
                    first = %registry.node(first).key(),
                    ignored = %registry.node(module).key(),
                    "procedure exported by more than one module; keeping the first"
                ),
                Some(_) => {}
                None => {
                    self.owners.insert(name, module);
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<TargetId> {
        self.owners.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
