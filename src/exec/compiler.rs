// src/exec/compiler.rs

//! Pluggable compilation backend.
//!
//! The build driver talks to a `Compiler` instead of spawning processes
//! itself, so tests can swap in a fake that records what it was asked to
//! build.
//!
//! - [`ShellCompiler`](super::ShellCompiler) runs a target's local `cmd`.
//! - [`DryRunCompiler`] only logs what would be built.

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::dag::graph::TargetNode;
use crate::errors::Result;

use super::CompileOutcome;

/// Boxed future returned by [`Compiler::compile`].
pub type CompileFuture<'a> = Pin<Box<dyn Future<Output = Result<CompileOutcome>> + Send + 'a>>;

/// Trait abstracting how one target gets built.
///
/// `Err` is reserved for failures to even attempt the build (e.g. the
/// process could not be spawned); a compiler that ran and failed reports
/// [`CompileOutcome::Failed`].
pub trait Compiler: Send {
    fn compile<'a>(&'a mut self, node: &'a TargetNode) -> CompileFuture<'a>;
}

/// Compiler that builds nothing and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunCompiler;

impl DryRunCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for DryRunCompiler {
    fn compile<'a>(&'a mut self, node: &'a TargetNode) -> CompileFuture<'a> {
        Box::pin(async move {
            let key = node.key();
            info!(
                key = %key,
                kind = %key.compilation_kind(),
                "dry run: would build"
            );
            Ok(CompileOutcome::Success)
        })
    }
}
