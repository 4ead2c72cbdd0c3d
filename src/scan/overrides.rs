// src/scan/overrides.rs

//! File overrides declared in pre-build hooks.

use std::collections::HashMap;

use tracing::debug;

use crate::config::model::{BuildSpec, HookCommand};
use crate::scan::rules::normalize_object_name;

const OVERRIDE_COMMANDS: [&str; 2] = ["OVRDBF", "OVRPRTF"];

/// Overridden file name to the file actually opened.
///
/// Built once before scanning and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct OverrideMap {
    files: HashMap<String, String>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect overrides from the global `before` hooks, then from each
    /// target's `before` hooks in declaration order. Later entries for the
    /// same file win.
    pub fn from_spec(spec: &BuildSpec) -> Self {
        let hooks = spec
            .hooks
            .before
            .iter()
            .chain(spec.targets.iter().flat_map(|(_, t)| t.hooks.before.iter()));
        Self::from_hooks(hooks)
    }

    pub fn from_hooks<'a>(hooks: impl IntoIterator<Item = &'a HookCommand>) -> Self {
        let mut map = Self::new();
        for hook in hooks {
            if !OVERRIDE_COMMANDS.contains(&hook.command.as_str()) {
                continue;
            }
            let from = hook.param("FILE").and_then(normalize_object_name);
            let to = hook.param("TOFILE").and_then(normalize_object_name);
            match (from, to) {
                (Some(from), Some(to)) => map.insert(from, to),
                _ => debug!(
                    command = %hook.command,
                    params = ?hook.params,
                    "override without a usable FILE/TOFILE pair; ignored"
                ),
            }
        }
        map
    }

    pub fn insert(&mut self, from: String, to: String) {
        if from != to {
            self.files.insert(from, to);
        }
    }

    /// Substitute `name` if it is overridden, else return it unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.files.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_overridden_files() {
        let hooks = [
            HookCommand::new("ovrdbf")
                .with_param("file", "TMPCUST")
                .with_param("tofile", "MYLIB/CUSTOMER"),
            HookCommand::new("OVRPRTF")
                .with_param("FILE", "'QSYSPRT'")
                .with_param("TOFILE", "INVOICE"),
            HookCommand::new("CHGJOB").with_param("FILE", "X"),
            HookCommand::new("OVRDBF")
                .with_param("FILE", "SAME")
                .with_param("TOFILE", "*FILE"),
        ];
        let map = OverrideMap::from_hooks(&hooks);

        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("TMPCUST"), "CUSTOMER");
        assert_eq!(map.resolve("QSYSPRT"), "INVOICE");
        assert_eq!(map.resolve("SAME"), "SAME");
        assert_eq!(map.resolve("OTHER"), "OTHER");
    }

    #[test]
    fn later_overrides_win() {
        let hooks = [
            HookCommand::new("OVRDBF")
                .with_param("FILE", "TMP")
                .with_param("TOFILE", "FIRST"),
            HookCommand::new("OVRDBF")
                .with_param("FILE", "TMP")
                .with_param("TOFILE", "SECOND"),
        ];
        assert_eq!(OverrideMap::from_hooks(&hooks).resolve("TMP"), "SECOND");
    }
}
