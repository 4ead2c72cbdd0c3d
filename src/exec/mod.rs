// src/exec/mod.rs

//! Compilation layer seen by the build driver.
//!
//! - [`compiler`] defines the `Compiler` trait and a dry-run implementation.
//! - [`shell`] runs a target's local command with `tokio::process`.

pub mod compiler;
pub mod shell;

pub use compiler::{CompileFuture, Compiler, DryRunCompiler};
pub use shell::ShellCompiler;

/// Outcome of compiling one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Success,
    Failed(i32),
}
