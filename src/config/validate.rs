// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use crate::config::model::{
    BuildSpec, HookCommand, HookEntry, Hooks, RawBuildSpec, RawTargetSpec, TargetSpec,
};
use crate::dag::key::TargetKey;
use crate::errors::{BuildError, Result};

impl TryFrom<RawBuildSpec> for BuildSpec {
    type Error = BuildError;

    fn try_from(raw: RawBuildSpec) -> std::result::Result<Self, Self::Error> {
        ensure_has_targets(&raw)?;

        let defaults = params_from_table(&raw.defaults, "[defaults]")?;
        let hooks = hooks_from_raw(&raw.before, "global")?;
        let targets = validate_targets(&raw.targets)?;

        Ok(BuildSpec {
            base_dir: raw.build.base_dir,
            defaults,
            hooks,
            targets,
        })
    }
}

fn ensure_has_targets(raw: &RawBuildSpec) -> Result<()> {
    if raw.targets.is_empty() {
        return Err(BuildError::ConfigError(
            "spec must contain at least one [targets.\"<key>\"] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_targets(table: &toml::Table) -> Result<Vec<(TargetKey, TargetSpec)>> {
    let mut seen: HashSet<TargetKey> = HashSet::new();
    let mut targets = Vec::with_capacity(table.len());

    for (raw_key, value) in table.iter() {
        let key: TargetKey = raw_key.parse()?;
        if !seen.insert(key.clone()) {
            return Err(BuildError::ConfigError(format!(
                "target '{raw_key}' is declared more than once (as {key})"
            )));
        }

        let raw: RawTargetSpec = value.clone().try_into().map_err(|e| {
            BuildError::ConfigError(format!("invalid settings for target '{raw_key}': {e}"))
        })?;

        let params = params_from_table(&raw.params, raw_key)?;
        let hooks = hooks_from_raw(&raw.before, raw_key)?;
        let cmd = raw.cmd.filter(|c| !c.trim().is_empty());

        targets.push((key, TargetSpec { params, hooks, cmd }));
    }

    Ok(targets)
}

fn params_from_table(table: &toml::Table, owner: &str) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for (name, value) in table.iter() {
        let name = name.trim().to_uppercase();
        if name.is_empty() {
            return Err(BuildError::ConfigError(format!(
                "empty parameter name in {owner}"
            )));
        }
        params.insert(name, value_to_param(value));
    }
    Ok(params)
}

fn hooks_from_raw(before: &[HookEntry], owner: &str) -> Result<Hooks> {
    Ok(Hooks {
        before: commands_from_entries(before, owner)?,
    })
}

fn commands_from_entries(entries: &[HookEntry], owner: &str) -> Result<Vec<HookCommand>> {
    let mut commands = Vec::new();
    for HookEntry(entry) in entries {
        for (command, params) in entry.iter() {
            let toml::Value::Table(params) = params else {
                return Err(BuildError::ConfigError(format!(
                    "hook command {command} in {owner} must map parameters to values"
                )));
            };
            let mut cmd = HookCommand::new(command);
            cmd.params = params_from_table(params, owner)?;
            commands.push(cmd);
        }
    }
    Ok(commands)
}

/// Render a TOML value the way it is written in a command parameter.
///
/// Arrays become space-separated lists, so `MODULE = ["MOD1", "MOD2"]` and
/// `MODULE = "MOD1 MOD2"` mean the same thing.
fn value_to_param(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(value_to_param)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<BuildSpec> {
        let raw: RawBuildSpec = toml::from_str(src)?;
        BuildSpec::try_from(raw)
    }

    #[test]
    fn keeps_declaration_order_and_params() {
        let spec = parse(
            r#"
[defaults]
tgtrls = "V7R5M0"

[targets."mylib.zeta.pgm.rpgle"]
params = { SRCSTMF = "zeta.pgm.rpgle", TEXT = "last letter" }

[targets."mylib.alpha.srvpgm.bnd"]
params = { MODULE = ["MOD1", "mylib/MOD2"] }
"#,
        )
        .unwrap();

        let names: Vec<String> = spec.targets.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, vec!["MYLIB.ZETA.PGM.RPGLE", "MYLIB.ALPHA.SRVPGM.BND"]);
        assert_eq!(spec.defaults.get("TGTRLS").map(String::as_str), Some("V7R5M0"));

        let (_, alpha) = &spec.targets[1];
        assert_eq!(alpha.params.get("MODULE").map(String::as_str), Some("MOD1 mylib/MOD2"));

        let effective = spec.effective_params(&spec.targets[0].1);
        assert_eq!(effective.get("TGTRLS").map(String::as_str), Some("V7R5M0"));
        assert_eq!(effective.get("TEXT").map(String::as_str), Some("last letter"));
    }

    #[test]
    fn reads_global_and_target_hooks() {
        let spec = parse(
            r#"
[[before]]
OVRDBF = { FILE = "TMPCUST", TOFILE = "MYLIB/CUSTOMER" }

[targets."mylib.hello.pgm.rpgle"]
before = [{ ovrdbf = { file = "x", tofile = "y" } }]
"#,
        )
        .unwrap();

        assert_eq!(spec.hooks.before.len(), 1);
        assert_eq!(spec.hooks.before[0].command, "OVRDBF");
        assert_eq!(spec.hooks.before[0].param("TOFILE"), Some("MYLIB/CUSTOMER"));

        let target_hooks = &spec.targets[0].1.hooks.before;
        assert_eq!(target_hooks[0].command, "OVRDBF");
        assert_eq!(target_hooks[0].param("FILE"), Some("x"));
    }

    #[test]
    fn rejects_empty_spec() {
        assert!(matches!(parse(""), Err(BuildError::ConfigError(_))));
    }

    #[test]
    fn rejects_keys_equal_after_normalization() {
        let err = parse(
            r#"
[targets."mylib.hello.pgm.rpgle"]
[targets."MYLIB.HELLO.PGM.RPGLE"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(msg) if msg.contains("more than once")));
    }

    #[test]
    fn rejects_invalid_keys() {
        let err = parse(
            r#"
[targets."mylib.hello.pgm"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidTargetKey { .. }));
    }

    #[test]
    fn other_hook_lists_are_accepted_and_ignored() {
        let spec = parse(
            r#"
[[after]]
DLTOVR = { FILE = "*ALL" }

[targets."mylib.hello.pgm.rpgle"]
success = [{ sndmsg = { msg = "done" } }]
failure = "not even a list"
"#,
        )
        .unwrap();

        assert!(spec.hooks.before.is_empty());
        assert!(spec.targets[0].1.hooks.before.is_empty());
    }

    #[test]
    fn rejects_hook_without_parameter_table() {
        let err = parse(
            r#"
[[before]]
OVRDBF = "FILE(X)"

[targets."mylib.hello.pgm.rpgle"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(msg) if msg.contains("OVRDBF")));
    }
}
