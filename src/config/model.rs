// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::key::TargetKey;

/// Build specification as read from a TOML file, before validation.
///
/// ```toml
/// [build]
/// base_dir = "."
///
/// [defaults]
/// TGTRLS = "V7R5M0"
///
/// [[before]]
/// OVRDBF = { FILE = "TMPCUST", TOFILE = "MYLIB/CUSTOMER" }
///
/// [targets."mylib.hello.pgm.rpgle"]
/// params = { SRCSTMF = "qrpglesrc/hello.pgm.rpgle" }
/// ```
///
/// `targets` stays a raw table so declaration order survives
/// deserialization (`toml` is built with `preserve_order`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBuildSpec {
    #[serde(default)]
    pub build: BuildSection,

    /// Global default compile parameters.
    #[serde(default)]
    pub defaults: toml::Table,

    /// Commands run before every compile. Only file overrides matter here.
    #[serde(default)]
    pub before: Vec<HookEntry>,

    /// `[targets."<key>"]` tables, in file order.
    #[serde(default)]
    pub targets: toml::Table,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BuildSection {
    /// Directory relative stream-file paths are resolved against.
    ///
    /// Relative values are taken relative to the spec file; when absent the
    /// spec file's own directory is used.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

/// `[targets."<key>"]` table, before validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTargetSpec {
    #[serde(default)]
    pub params: toml::Table,

    /// Commands run before every compile. Only file overrides matter here.
    #[serde(default)]
    pub before: Vec<HookEntry>,

    /// Optional local command run by the shell compiler.
    #[serde(default)]
    pub cmd: Option<String>,
}

/// One hook list element: `{ COMMAND = { PARAM = value, ... }, ... }`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct HookEntry(pub toml::Table);

/// A single hook command with upper-cased parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookCommand {
    pub command: String,
    pub params: BTreeMap<String, String>,
}

impl HookCommand {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.trim().to_uppercase(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params
            .insert(name.trim().to_uppercase(), value.to_string());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}

/// Hook commands attached globally or to a single target.
///
/// `before` hooks are read for `OVRDBF`/`OVRPRTF` file overrides; other
/// hook lists concern command execution on the host and are not modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pub before: Vec<HookCommand>,
}

/// Validated per-target settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSpec {
    /// Compile parameter overrides, names upper-cased.
    pub params: BTreeMap<String, String>,
    pub hooks: Hooks,
    pub cmd: Option<String>,
}

/// Validated build specification.
///
/// Construct via `BuildSpec::try_from(raw)` (see `validate.rs`) or the
/// loader; tests may also assemble one directly.
#[derive(Debug, Clone, Default)]
pub struct BuildSpec {
    pub base_dir: Option<PathBuf>,
    pub defaults: BTreeMap<String, String>,
    pub hooks: Hooks,
    /// Targets in declaration order.
    pub targets: Vec<(TargetKey, TargetSpec)>,
}

impl BuildSpec {
    /// Global defaults overlaid by the target's own parameters.
    pub fn effective_params(&self, target: &TargetSpec) -> BTreeMap<String, String> {
        let mut params = self.defaults.clone();
        params.extend(
            target
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        params
    }
}
