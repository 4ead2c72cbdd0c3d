// src/scan/mod.rs

//! Dependency detection over target sources.
//!
//! A scan runs in two barrier-separated phases on Tokio's blocking pool:
//!
//! 1. the export pre-pass reads every RPG module and fills the
//!    [`ExportIndex`];
//! 2. the main pass runs one task per target, extracts references with the
//!    [`rules`] for its compilation kind, resolves them against the
//!    registry and installs edges.
//!
//! Each task buffers its diagnostics in a [`TaskLog`]; logs are flushed in
//! declaration order once the pass has joined.

pub mod exports;
pub mod overrides;
pub mod rules;
pub mod task_log;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::graph::{EdgeInsert, TargetId, TargetRegistry};
use crate::dag::key::TargetKey;
use crate::errors::{BuildError, Result};
use crate::fs::SourceStore;
use crate::types::ResolveClass;

pub use exports::ExportIndex;
pub use overrides::OverrideMap;
pub use rules::{Reference, ReferenceKind, Resolution};
pub use task_log::{LogLine, TaskLog};

/// What a scan found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Targets that got a main-pass task.
    pub scanned: usize,
    /// Edges newly installed by this scan.
    pub edges_added: usize,
    /// Procedures in the export index.
    pub exports: usize,
    /// Targets whose scan failed; their dependency sets may be partial.
    pub failed: Vec<TargetKey>,
    /// Per-target scan logs, in declaration order.
    pub logs: Vec<(TargetKey, TaskLog)>,
}

/// Populates a [`TargetRegistry`] with edges derived from source text.
#[derive(Debug, Clone)]
pub struct DependencyScanner {
    registry: Arc<TargetRegistry>,
    sources: Arc<dyn SourceStore>,
    base_dir: Option<PathBuf>,
    overrides: Arc<OverrideMap>,
    verbose: bool,
}

/// Read-only state shared by main-pass tasks.
struct ScanContext {
    registry: Arc<TargetRegistry>,
    sources: Arc<dyn SourceStore>,
    base_dir: PathBuf,
    exports: ExportIndex,
    overrides: Arc<OverrideMap>,
    verbose: bool,
    completed: AtomicUsize,
    total: usize,
}

impl DependencyScanner {
    pub fn new(
        registry: Arc<TargetRegistry>,
        sources: Arc<dyn SourceStore>,
        base_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            registry,
            sources,
            base_dir,
            overrides: Arc::new(OverrideMap::default()),
            verbose: false,
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideMap) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    /// Also log unresolved references and per-target progress detail.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Run both passes. Configuration problems abort before any task is
    /// spawned; failures inside one target's task are logged and reported
    /// in [`ScanReport::failed`].
    pub async fn scan(&self) -> Result<ScanReport> {
        let base_dir = self.preflight()?;

        if self.verbose {
            info!("detecting source object dependencies");
        }

        let exports = self.collect_exports(&base_dir).await;
        debug!(procedures = exports.len(), "export index ready");

        let scan_ids: Vec<TargetId> = self
            .registry
            .nodes()
            .filter(|n| {
                n.location().is_some()
                    || !rules::parameter_references(n.key(), n.params()).is_empty()
            })
            .map(|n| n.id())
            .collect();

        let ctx = Arc::new(ScanContext {
            registry: Arc::clone(&self.registry),
            sources: Arc::clone(&self.sources),
            base_dir,
            exports,
            overrides: Arc::clone(&self.overrides),
            verbose: self.verbose,
            completed: AtomicUsize::new(0),
            total: scan_ids.len(),
        });

        let mut tasks = JoinSet::new();
        let mut owners = HashMap::new();
        for &id in &scan_ids {
            let ctx = Arc::clone(&ctx);
            let handle = tasks.spawn_blocking(move || {
                let outcome = scan_target(&ctx, id);
                ctx.report_progress();
                outcome
            });
            owners.insert(handle.id(), id);
        }

        let mut logs: Vec<Option<TaskLog>> = vec![None; self.registry.len()];
        let mut report = ScanReport {
            scanned: scan_ids.len(),
            exports: ctx.exports.len(),
            ..ScanReport::default()
        };

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => {
                    report.edges_added += outcome.edges_added;
                    if outcome.failed {
                        report.failed.push(self.registry.node(outcome.id).key().clone());
                    }
                    logs[outcome.id.0] = Some(outcome.log);
                }
                Err(err) => {
                    let Some(&id) = owners.get(&err.id()) else {
                        error!(error = %err, "scan task failed");
                        continue;
                    };
                    let key = self.registry.node(id).key().clone();
                    let mut log = TaskLog::new();
                    log.error(format!("scan task for {key} did not complete: {err}"));
                    logs[id.0] = Some(log);
                    report.failed.push(key);
                }
            }
        }

        for (idx, log) in logs.into_iter().enumerate() {
            if let Some(log) = log {
                let key = self.registry.node(TargetId(idx)).key().clone();
                log.flush(&key);
                report.logs.push((key, log));
            }
        }

        report.failed.sort();
        info!(
            targets = report.scanned,
            edges = report.edges_added,
            failed = report.failed.len(),
            "dependency scan finished"
        );
        Ok(report)
    }

    /// Fatal configuration checks: the base directory and every declared
    /// source must exist.
    fn preflight(&self) -> Result<PathBuf> {
        let base_dir = match &self.base_dir {
            Some(dir) if self.sources.is_dir(dir) => dir.clone(),
            other => return Err(BuildError::MissingBaseDirectory(other.clone())),
        };

        for node in self.registry.nodes() {
            if let Some(location) = node.location() {
                let path = location.resolve(&base_dir);
                if !self.sources.exists(&path) {
                    return Err(BuildError::SourceNotFound {
                        target: node.key().to_string(),
                        path,
                    });
                }
            }
        }

        Ok(base_dir)
    }

    /// Pre-pass: read every exporting module and index its procedures.
    ///
    /// Runs to completion before the main pass starts. Results are merged in
    /// declaration order so duplicate exports resolve the same way each run.
    async fn collect_exports(&self, base_dir: &Path) -> ExportIndex {
        let mut tasks = JoinSet::new();

        for node in self.registry.nodes() {
            let Some(location) = node.location() else {
                continue;
            };
            if !exports::exports_procedures(node.key()) {
                continue;
            }
            let id = node.id();
            let path = location.resolve(base_dir);
            let sources = Arc::clone(&self.sources);
            tasks.spawn_blocking(move || {
                let names = sources
                    .read_to_string(&path)
                    .map(|text| exports::exported_procedures(&text));
                (id, names)
            });
        }

        let mut found: Vec<(TargetId, BTreeSet<String>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(names))) => found.push((id, names)),
                Ok((id, Err(err))) => warn!(
                    key = %self.registry.node(id).key(),
                    error = %err,
                    "failed to read module source for export collection"
                ),
                Err(err) => error!(error = %err, "export collection task failed"),
            }
        }
        found.sort_by_key(|(id, _)| *id);

        let mut index = ExportIndex::new();
        for (id, names) in found {
            if self.verbose && !names.is_empty() {
                info!(
                    key = %self.registry.node(id).key(),
                    exports = ?names,
                    "module exports"
                );
            }
            index.insert_all(&self.registry, id, names);
        }
        index
    }
}

impl ScanContext {
    fn report_progress(&self) {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let percent = if self.total == 0 {
            100
        } else {
            done * 100 / self.total
        };
        info!("Processed {} of {} targets ({}%)", done, self.total, percent);
    }

    fn resolve(&self, reference: &Reference, log: &mut TaskLog) -> Option<TargetId> {
        match reference.kind.resolution() {
            Resolution::Class(ResolveClass::File) => {
                let name = self.overrides.resolve(&reference.name);
                if name != reference.name && self.verbose {
                    log.info(format!(
                        "{}('{}') is overridden to {}",
                        reference.kind.label(),
                        reference.name,
                        name
                    ));
                }
                self.registry.resolve(ResolveClass::File, name)
            }
            Resolution::Class(class) => self.registry.resolve(class, &reference.name),
            Resolution::ExportedProcedure => self.exports.lookup(&reference.name),
        }
    }
}

/// Result of one main-pass task.
struct TargetScan {
    id: TargetId,
    log: TaskLog,
    edges_added: usize,
    failed: bool,
}

fn scan_target(ctx: &ScanContext, id: TargetId) -> TargetScan {
    let mut log = TaskLog::new();
    let mut edges_added = 0;
    let result = scan_target_inner(ctx, id, &mut log, &mut edges_added);

    let failed = match result {
        Ok(()) => false,
        Err(err) => {
            log.error(format!("dependency scan failed: {err:#}"));
            true
        }
    };

    TargetScan {
        id,
        log,
        edges_added,
        failed,
    }
}

fn scan_target_inner(
    ctx: &ScanContext,
    id: TargetId,
    log: &mut TaskLog,
    edges_added: &mut usize,
) -> anyhow::Result<()> {
    let node = ctx.registry.node(id);
    let key = node.key();
    let kind = key.compilation_kind();

    if ctx.verbose {
        log.info(format!("Scanning sources: {key}"));
    }

    let mut references = rules::parameter_references(key, node.params());
    if let Some(location) = node.location() {
        let path = location.resolve(&ctx.base_dir);
        let text = ctx
            .sources
            .read_to_string(&path)
            .with_context(|| format!("reading source of {key}"))?;
        references.extend(rules::extract_references(kind, &text));
    }

    for reference in &references {
        let Some(dependency) = ctx.resolve(reference, log) else {
            if ctx.verbose {
                log.info(format!(
                    "{}('{}') is not a declared target; ignored",
                    reference.kind.label(),
                    reference.name
                ));
            }
            continue;
        };

        match ctx.registry.add_edge(id, dependency) {
            EdgeInsert::Added => {
                *edges_added += 1;
                log.info(format!(
                    "{} depends on {} ({}('{}'))",
                    key,
                    ctx.registry.node(dependency).key(),
                    reference.kind.label(),
                    reference.name
                ));
            }
            EdgeInsert::AlreadyPresent => {}
            EdgeInsert::SelfReference => log.debug(format!(
                "{}('{}') refers to the target itself",
                reference.kind.label(),
                reference.name
            )),
        }
    }

    if node.child_count() == 0 {
        log.info(format!("{key}: no dependencies found"));
    }

    Ok(())
}
