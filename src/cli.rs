// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::engine::BuildOrdering;

/// Command-line arguments for `objdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "objdag",
    version,
    about = "Dependency-aware incremental builds for IBM i objects.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build spec (TOML).
    ///
    /// Default: `Objdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Objdag.toml")]
    pub spec: String,

    /// Only build targets whose source changed since their last build,
    /// plus the targets depending on them.
    #[arg(long)]
    pub diff: bool,

    /// Order targets are built in.
    #[arg(long, value_enum, value_name = "ORDER", default_value_t = OrderArg::Declaration)]
    pub order: OrderArg,

    /// Scan and print targets, dependencies and the build order, but don't
    /// execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Log unresolved references and per-target scan detail.
    #[arg(long, short)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OBJDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Build order as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// As declared in the spec.
    Declaration,
    /// Dependencies before the targets using them.
    Dependencies,
}

impl From<OrderArg> for BuildOrdering {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Declaration => BuildOrdering::Declaration,
            OrderArg::Dependencies => BuildOrdering::Dependencies,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["objdag"]).unwrap();
        assert_eq!(args.spec, "Objdag.toml");
        assert_eq!(args.order, OrderArg::Declaration);
        assert!(!args.diff && !args.dry_run && !args.verbose);
    }

    #[test]
    fn parses_build_flags() {
        let args = CliArgs::try_parse_from([
            "objdag",
            "--spec",
            "build/Objdag.toml",
            "--diff",
            "--order",
            "dependencies",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(args.diff);
        assert_eq!(BuildOrdering::from(args.order), BuildOrdering::Dependencies);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
