// tests/spec_loading.rs

use std::fs;
use std::io::Write;

use clap::Parser;
use objdag::cli::CliArgs;
use objdag::config::load_and_validate;
use objdag::engine::STAMP_FILE_PATH;
use objdag::errors::BuildError;
use objdag_test_utils::{init_tracing, with_timeout};
use tempfile::{tempdir, NamedTempFile};

const SPEC: &str = r#"
[build]
base_dir = "src"

[defaults]
TGTRLS = "V7R5M0"

[[before]]
OVRDBF = { FILE = "TMPCUST", TOFILE = "MYLIB/CUSTFILE" }

[targets."mylib.custinq.pgm.rpgle"]
params = { SRCSTMF = "custinq.pgm.rpgle", DBGVIEW = "*SOURCE" }
cmd = "echo $OBJDAG_OBJECT >> built.log"

[targets."mylib.custfile.pf.dds"]
params = { SRCSTMF = "custfile.pf" }
cmd = "echo $OBJDAG_OBJECT >> built.log"
"#;

fn write_project(root: &std::path::Path) {
    fs::write(root.join("Objdag.toml"), SPEC).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/custfile.pf"), "     A          R CUSTREC\n").unwrap();
    fs::write(
        root.join("src/custinq.pgm.rpgle"),
        "**free\ndcl-f tmpcust keyed;\n*inlr = *on;\n",
    )
    .unwrap();
}

#[test]
fn relative_base_dir_is_anchored_at_the_spec_file() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let spec = load_and_validate(dir.path().join("Objdag.toml")).unwrap();

    assert_eq!(spec.base_dir, Some(dir.path().join("src")));
    assert_eq!(spec.targets.len(), 2);
    assert_eq!(spec.targets[0].0.to_string(), "MYLIB.CUSTINQ.PGM.RPGLE");
    assert_eq!(spec.hooks.before[0].param("FILE"), Some("TMPCUST"));

    let effective = spec.effective_params(&spec.targets[0].1);
    assert_eq!(effective.get("TGTRLS").map(String::as_str), Some("V7R5M0"));
    assert_eq!(effective.get("DBGVIEW").map(String::as_str), Some("*SOURCE"));
}

#[test]
fn missing_base_dir_defaults_to_the_spec_directory() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[targets."mylib.hello.pgm.rpgle"]
params = {{ SRCSTMF = "hello.pgm.rpgle" }}
"#
    )
    .unwrap();

    let spec = load_and_validate(file.path()).unwrap();
    assert_eq!(spec.base_dir.as_deref(), file.path().parent());
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[targets.\"mylib.hello.pgm.rpgle\"\nparams = ").unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, BuildError::TomlError(_)));
}

#[test]
fn unknown_source_type_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[targets."mylib.hello.pgm.cobol"]
"#
    )
    .unwrap();

    let err = load_and_validate(file.path()).unwrap_err();
    match err {
        BuildError::InvalidTargetKey { key, reason } => {
            assert_eq!(key, "mylib.hello.pgm.cobol");
            assert!(reason.contains("source type"));
        }
        other => panic!("expected InvalidTargetKey, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn end_to_end_build_then_nothing_to_do() {
    init_tracing();

    let dir = tempdir().unwrap();
    write_project(dir.path());
    let spec_path = dir.path().join("Objdag.toml");
    let log_path = dir.path().join("src/built.log");

    let args = CliArgs::try_parse_from([
        "objdag",
        "--spec",
        spec_path.to_str().unwrap(),
        "--order",
        "dependencies",
    ])
    .unwrap();
    with_timeout(objdag::run(args)).await.unwrap();

    let built = fs::read_to_string(&log_path).unwrap();
    let built: Vec<&str> = built.lines().collect();
    assert_eq!(built, vec!["CUSTFILE", "CUSTINQ"]);
    assert!(dir.path().join("src").join(STAMP_FILE_PATH).exists());

    let args = CliArgs::try_parse_from([
        "objdag",
        "--spec",
        spec_path.to_str().unwrap(),
        "--order",
        "dependencies",
        "--diff",
    ])
    .unwrap();
    with_timeout(objdag::run(args)).await.unwrap();

    let again = fs::read_to_string(&log_path).unwrap();
    assert_eq!(again.lines().count(), 2);
}
