// src/exec/shell.rs

//! Runs a target's local `cmd` through the shell.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};

use crate::dag::graph::TargetNode;

use super::compiler::{CompileFuture, Compiler};
use super::CompileOutcome;

/// Compiler that executes the optional `cmd` of each target.
///
/// The command runs in the base directory with `sh -c` (`cmd /C` on
/// Windows) and sees the target through `OBJDAG_*` environment variables.
/// Targets without a `cmd` succeed without doing anything: synthesizing
/// the platform creation command is left to whoever provides one.
#[derive(Debug, Clone)]
pub struct ShellCompiler {
    base_dir: PathBuf,
}

impl ShellCompiler {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    async fn run(&self, node: &TargetNode, cmd_line: &str) -> anyhow::Result<CompileOutcome> {
        let key = node.key();
        info!(key = %key, cmd = %cmd_line, "starting compile command");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(cmd_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(cmd_line);
            c
        };

        cmd.current_dir(&self.base_dir)
            .env("OBJDAG_TARGET", key.to_string())
            .env("OBJDAG_LIBRARY", key.library())
            .env("OBJDAG_OBJECT", key.object_name())
            .env("OBJDAG_OBJECT_TYPE", key.object_type().as_str())
            .env("OBJDAG_KIND", key.compilation_kind().as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(location) = node.location() {
            cmd.env("OBJDAG_SOURCE", location.resolve(&self.base_dir));
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning compile command for {key}"))?;

        // Consume both pipes so the child never blocks on a full buffer.
        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, key.to_string(), Level::INFO)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, key.to_string(), Level::DEBUG)));

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for compile command of {key}"))?;

        // Output must be fully logged before the exit line.
        let stdout_lines = drain(stdout).await;
        let stderr_lines = drain(stderr).await;

        let code = status.code().unwrap_or(-1);
        info!(
            key = %key,
            exit_code = code,
            success = status.success(),
            stdout_lines,
            stderr_lines,
            "compile command exited"
        );

        Ok(if status.success() {
            CompileOutcome::Success
        } else {
            CompileOutcome::Failed(code)
        })
    }
}

/// Log every line of one output stream and return how many there were.
async fn forward_lines<R>(reader: R, target: String, level: Level) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut count = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        count += 1;
        if level == Level::INFO {
            info!(key = %target, "{}", line);
        } else {
            debug!(key = %target, "stderr: {}", line);
        }
    }
    count
}

async fn drain(reader: Option<JoinHandle<usize>>) -> usize {
    let Some(handle) = reader else {
        return 0;
    };
    match handle.await {
        Ok(count) => count,
        Err(err) => {
            warn!(error = %err, "output reader task failed");
            0
        }
    }
}

impl Compiler for ShellCompiler {
    fn compile<'a>(&'a mut self, node: &'a TargetNode) -> CompileFuture<'a> {
        Box::pin(async move {
            match node.spec().cmd.as_deref() {
                Some(cmd_line) => Ok(self.run(node, cmd_line).await?),
                None => {
                    debug!(key = %node.key(), "no local command; nothing to run");
                    Ok(CompileOutcome::Success)
                }
            }
        })
    }
}
