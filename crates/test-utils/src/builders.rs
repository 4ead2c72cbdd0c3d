#![allow(dead_code)]

use std::path::PathBuf;

use objdag::config::model::{HookEntry, RawBuildSpec};
use objdag::config::BuildSpec;

/// Base directory used by builder specs and mock filesystems.
pub const BASE_DIR: &str = "/project";

fn hook_entry(command: &str, params: &[(&str, &str)]) -> toml::Table {
    let params: toml::Table = params
        .iter()
        .map(|(k, v)| (k.to_string(), toml::Value::String(v.to_string())))
        .collect();
    let mut entry = toml::Table::new();
    entry.insert(command.to_string(), toml::Value::Table(params));
    entry
}

/// Builder for `BuildSpec`, going through the same validation as a spec
/// file.
pub struct SpecBuilder {
    raw: RawBuildSpec,
}

impl SpecBuilder {
    pub fn new() -> Self {
        let mut raw = RawBuildSpec::default();
        raw.build.base_dir = Some(PathBuf::from(BASE_DIR));
        Self { raw }
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw.build.base_dir = Some(dir.into());
        self
    }

    pub fn without_base_dir(mut self) -> Self {
        self.raw.build.base_dir = None;
        self
    }

    pub fn default_param(mut self, name: &str, value: &str) -> Self {
        self.raw
            .defaults
            .insert(name.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn global_before(mut self, command: &str, params: &[(&str, &str)]) -> Self {
        self.raw.before.push(HookEntry(hook_entry(command, params)));
        self
    }

    pub fn target(mut self, key: &str, target: TargetBuilder) -> Self {
        self.raw
            .targets
            .insert(key.to_string(), toml::Value::Table(target.build()));
        self
    }

    /// Shorthand for a target whose source is a stream file.
    pub fn stream_target(self, key: &str, path: &str) -> Self {
        self.target(key, TargetBuilder::new().stream(path))
    }

    pub fn build(self) -> BuildSpec {
        BuildSpec::try_from(self.raw).expect("Failed to build valid spec from builder")
    }
}

impl Default for SpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `[targets."<key>"]` table.
#[derive(Default)]
pub struct TargetBuilder {
    params: toml::Table,
    before: Vec<toml::Value>,
    cmd: Option<String>,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream(self, path: &str) -> Self {
        self.param("SRCSTMF", path)
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params
            .insert(name.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn before(mut self, command: &str, params: &[(&str, &str)]) -> Self {
        self.before
            .push(toml::Value::Table(hook_entry(command, params)));
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> toml::Table {
        let mut table = toml::Table::new();
        table.insert("params".to_string(), toml::Value::Table(self.params));
        if !self.before.is_empty() {
            table.insert("before".to_string(), toml::Value::Array(self.before));
        }
        if let Some(cmd) = self.cmd {
            table.insert("cmd".to_string(), toml::Value::String(cmd));
        }
        table
    }
}
