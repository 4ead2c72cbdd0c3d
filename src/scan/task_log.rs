// src/scan/task_log.rs

//! Per-task log buffer, replayed after the scan barrier.

use tracing::{debug, error, info, warn, Level};

use crate::dag::key::TargetKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
}

/// Lines produced while scanning one target.
///
/// Scan tasks finish in any order; buffering their output and flushing it
/// in declaration order keeps the log readable and stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskLog {
    lines: Vec<LogLine>,
}

impl TaskLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.lines.push(LogLine {
            level,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::INFO, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(Level::DEBUG, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::ERROR, message);
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.message.as_str())
    }

    /// Emit every buffered line through `tracing`.
    pub fn flush(&self, target: &TargetKey) {
        for line in &self.lines {
            match line.level {
                Level::ERROR => error!(key = %target, "{}", line.message),
                Level::WARN => warn!(key = %target, "{}", line.message),
                Level::INFO => info!(key = %target, "{}", line.message),
                _ => debug!(key = %target, "{}", line.message),
            }
        }
    }
}
