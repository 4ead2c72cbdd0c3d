// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod scan;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::{TargetId, TargetRegistry, build_order};
use crate::engine::{BuildDriver, BuildOrdering, BuildSummary, FileStampStore, LocalMetadata};
use crate::exec::{DryRunCompiler, ShellCompiler};
use crate::fs::{RealFileSystem, SourceStore};
use crate::scan::{DependencyScanner, OverrideMap};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - spec loading and the target registry
/// - dependency scanning (when diffing, ordering by dependencies or dry-running)
/// - ordering
/// - the build driver with either the shell or the dry-run compiler
pub async fn run(args: CliArgs) -> Result<()> {
    let spec_path = PathBuf::from(&args.spec);
    let spec = load_and_validate(&spec_path)?;
    let base_dir = spec
        .base_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let registry = Arc::new(TargetRegistry::from_spec(&spec));
    let sources: Arc<dyn SourceStore> = Arc::new(RealFileSystem);
    let ordering = BuildOrdering::from(args.order);

    let needs_scan = args.diff || args.dry_run || ordering == BuildOrdering::Dependencies;
    if needs_scan {
        let report = DependencyScanner::new(
            Arc::clone(&registry),
            Arc::clone(&sources),
            spec.base_dir.clone(),
        )
        .with_overrides(OverrideMap::from_spec(&spec))
        .verbose(args.verbose)
        .scan()
        .await?;

        if !report.failed.is_empty() {
            warn!(
                failed = ?report.failed.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                "some targets could not be scanned; their dependencies may be incomplete"
            );
        }
    } else {
        debug!("dependency scan not needed for a full build in declaration order");
    }

    let order: Vec<TargetId> = match ordering {
        BuildOrdering::Declaration => registry.ids().collect(),
        BuildOrdering::Dependencies => build_order(&registry)?,
    };

    let metadata = LocalMetadata::new(
        Arc::clone(&sources),
        Box::new(FileStampStore::new(base_dir.clone())),
        &base_dir,
    );

    if args.dry_run {
        print_dry_run(&registry, &order, ordering);
        let mut driver = BuildDriver::new(
            &registry,
            Arc::clone(&sources),
            &base_dir,
            metadata,
            DryRunCompiler::new(),
        )
        .with_diff(args.diff)
        .with_dry_run(true);
        let summary = driver.run(&order).await?;
        print_plan(&summary);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let mut driver = BuildDriver::new(
        &registry,
        Arc::clone(&sources),
        &base_dir,
        metadata,
        ShellCompiler::new(&base_dir),
    )
    .with_diff(args.diff);
    let summary = driver.run(&order).await?;

    info!(
        built = summary.built.len(),
        skipped = summary.skipped.len(),
        "objdag finished"
    );
    Ok(())
}

/// Print targets, their dependencies and the chosen order.
fn print_dry_run(registry: &TargetRegistry, order: &[TargetId], ordering: BuildOrdering) {
    println!("objdag dry-run");
    println!();

    println!("targets ({}):", registry.len());
    for node in registry.nodes() {
        println!("  - {}", node.key());
        println!("      kind: {}", node.key().compilation_kind());
        match node.location() {
            Some(location) => println!("      source: {location}"),
            None => println!("      source: (none)"),
        }
        let children = node.children();
        if !children.is_empty() {
            let names: Vec<String> = children
                .iter()
                .map(|id| registry.node(*id).key().to_string())
                .collect();
            println!("      depends on: {}", names.join(", "));
        }
        if let Some(cmd) = node.spec().cmd.as_deref() {
            println!("      cmd: {cmd}");
        }
    }
    println!();

    println!("order ({ordering:?}):");
    for (position, id) in order.iter().enumerate() {
        println!("  {:>3}. {}", position + 1, registry.node(*id).key());
    }
    println!();
}

fn print_plan(summary: &BuildSummary) {
    println!("would build ({}):", summary.built.len());
    for key in &summary.built {
        println!("  - {key}");
    }
    if !summary.skipped.is_empty() {
        println!("up to date ({}):", summary.skipped.len());
        for key in &summary.skipped {
            println!("  - {key}");
        }
    }
}
