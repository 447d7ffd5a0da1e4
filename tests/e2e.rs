//! End-to-end tests that invoke the compiled `migration-dialect` binary as a subprocess.
//!
//! These tests exercise CLI argument parsing, config loading, output formats,
//! and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Locate the compiled binary built by `cargo test`.
fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_migration-dialect"))
}

/// Run the binary inside `dir` so no stray default config is picked up.
fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute migration-dialect binary")
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write file");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_resolve_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_in(dir.path(), &["resolve", "H2 1.4"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "H2Dialect\n");
}

#[test]
fn test_resolve_unsupported_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_in(dir.path(), &["resolve", "Not A Real Database 9.9"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("Unsupported Database: Not A Real Database 9.9"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_split_text_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_file(dir.path(), "V1__init.sql", "select 1; -- c1\nselect 2;\n");
    let output = run_in(
        dir.path(),
        &["split", "--database", "H2 1.4", script.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "-- statement 1, line 1\nselect 1\n\n-- statement 2, line 2\nselect 2\n"
    );
}

#[test]
fn test_split_json_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_file(
        dir.path(),
        "V2__batches.sql",
        "select 1\nGO\n\nselect 'GO;'\nGO\n",
    );
    let output = run_in(
        dir.path(),
        &[
            "split",
            "--database",
            "Microsoft SQL Server 15.0",
            "--format",
            "json",
            script.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(
        json,
        serde_json::json!([
            { "line_number": 1, "sql": "select 1" },
            { "line_number": 4, "sql": "select 'GO;'" },
        ])
    );
}

#[test]
fn test_split_unterminated_string_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_file(dir.path(), "V3__broken.sql", "select 1;\nselect 'oops;\n");
    let output = run_in(
        dir.path(),
        &["split", "--database", "PostgreSQL 16.2", script.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("Unterminated quoted string starting at line 2"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_custom_dialect_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(
        dir.path(),
        "custom.toml",
        "[dialects.custom]\n\"migration.dialect.H2\" = \"PostgreSqlDialect\"\n",
    );
    let output = run_in(
        dir.path(),
        &["--config", config.to_str().unwrap(), "resolve", "H2 1.4"],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "PostgreSqlDialect\n");
}

#[test]
fn test_default_config_file_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(
        dir.path(),
        "migration-dialect.toml",
        "[output]\nformat = \"json\"\n",
    );
    let script = write_file(dir.path(), "V1__init.sql", "select 1;");
    let output = run_in(
        dir.path(),
        &["split", "--database", "Oracle 19.0", script.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(json[0]["sql"], "select 1");
}

#[test]
fn test_unknown_handler_in_config_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(
        dir.path(),
        "custom.toml",
        "[dialects.custom]\nH2 = \"no.such.Type\"\n",
    );
    let output = run_in(
        dir.path(),
        &["--config", config.to_str().unwrap(), "resolve", "H2 1.4"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output)
            .contains("Could not find custom dialect handler for database H2: no.such.Type"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_missing_explicit_config_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_in(
        dir.path(),
        &["--config", "does-not-exist.toml", "resolve", "H2 1.4"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("Config file not found"),
        "stderr: {}",
        stderr(&output)
    );
}
