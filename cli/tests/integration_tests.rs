use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_cmdshell");

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A package with a `deploy` command and a `server` group.
fn write_package(dir: &Path) -> PathBuf {
    let json = serde_json::json!({
        "version": "1.0.0",
        "schemas": [
            {
                "name": "deploy",
                "aliases": ["dp"],
                "options": [
                    { "short": "e", "long": "env", "kind": "normal",
                      "value_type": { "choice": ["dev", "prod"] }, "required": true },
                    { "short": "f", "long": "force" },
                    { "long": "hosts", "kind": "list", "value_type": "string" },
                    { "long": "level", "kind": "normal", "value_type": "number",
                      "default_values": ["3"] }
                ],
                "argument": { "name": "targets", "multiple": true }
            },
            {
                "name": "server",
                "children": [
                    { "name": "start",
                      "options": [{ "short": "p", "long": "port", "kind": "normal", "value_type": "number" }] },
                    { "name": "stop" }
                ]
            }
        ]
    });
    let path = dir.join("schemas.json");
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN).args(args).output().expect("failed to run cmdshell")
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(BIN)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cmdshell");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_package_and_single_schema() {
    let dir = tempfile::tempdir().unwrap();
    let package = write_package(dir.path());
    let single = dir.path().join("single.yaml");
    std::fs::write(&single, "name: greet\noptions:\n  - long: loud\n").unwrap();

    let output = run(&["validate", package.to_str().unwrap(), single.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validated 2 schema file(s) for 3 command(s)."), "{stdout}");
}

#[test]
fn validate_rejects_duplicate_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    let json = serde_json::json!({
        "name": "bad",
        "options": [{ "long": "same" }, { "long": "same" }]
    });
    std::fs::write(&path, json.to_string()).unwrap();

    let output = run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "{stderr}");
    assert!(stderr.contains("duplicate option"), "{stderr}");
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_populated_values() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_package(dir.path());

    let output = run(&[
        "parse",
        "--schema",
        schema.to_str().unwrap(),
        "--line",
        "dp -f --env=prod --hosts a,b web db",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["command"], serde_json::json!(["deploy"]));
    assert_eq!(json["options"]["env"]["values"], serde_json::json!(["prod"]));
    assert_eq!(json["options"]["hosts"]["values"], serde_json::json!(["a", "b"]));
    assert_eq!(json["options"]["force"]["values"], serde_json::json!(["true"]));
    assert_eq!(json["options"]["level"]["source"], "default");
    assert_eq!(json["argument"], serde_json::json!(["web", "db"]));
}

#[test]
fn parse_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_package(dir.path());
    let schema = schema.to_str().unwrap();

    let output = run(&["parse", "--schema", schema, "--line", "deploy web"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("option --env is required"));

    let output = run(&["parse", "--schema", schema, "--line", "deploy -e qa"]);
    assert!(!output.status.success());

    let output = run(&["parse", "--schema", schema, "--line", "deploy -e qa", "--no-validate"]);
    assert!(output.status.success());

    let output = run(&["parse", "--schema", schema, "--line", "nope"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("No schema for line 'nope'"));
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

#[test]
fn complete_prints_target_and_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_package(dir.path());
    let schema = schema.to_str().unwrap();

    let output = run(&["complete", "--schema", schema, "--line", "deploy --e"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["target"]["kind"], "display_option_names");
    assert_eq!(json["candidates"]["candidates"][0]["value"], "--env=");

    let output = run(&["complete", "--schema", schema, "--line", "server s"]);
    let json = stdout_json(&output);
    assert_eq!(json["target"]["kind"], "child_command_names");
    assert_eq!(json["candidates"]["candidates"].as_array().unwrap().len(), 2);

    let output = run(&["complete", "--schema", schema, "--line", "de", "--cursor", "1"]);
    let json = stdout_json(&output);
    assert_eq!(json["target"]["kind"], "command_names");
    assert_eq!(json["candidates"]["candidates"][0]["value"], "deploy");

    let output = run(&["complete", "--schema", schema, "--line", "de", "--cursor", "9"]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_executes_lines_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_package(dir.path());

    let output = run_with_stdin(
        &["run", "--schema", schema.to_str().unwrap()],
        "server start -p 80\n\ndeploy -e dev && server stop\n",
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["command"], serde_json::json!(["server", "start"]));
    assert_eq!(lines[0]["options"]["port"]["values"], serde_json::json!(["80"]));
    assert_eq!(lines[1]["options"]["env"]["values"], serde_json::json!(["dev"]));
    assert_eq!(lines[2]["command"], serde_json::json!(["server", "stop"]));
}

#[test]
fn run_reports_failed_lines_and_help() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_package(dir.path());
    let config = dir.path().join("console.yaml");
    std::fs::write(&config, "operators: false\n").unwrap();

    let output = run_with_stdin(
        &[
            "run",
            "--schema",
            schema.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ],
        "deploy --help\nmissing\n",
    );
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Usage: deploy [OPTIONS] [targets...]"), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: command not found: missing"), "{stderr}");
    assert!(stderr.contains("error: 1 line(s) failed"), "{stderr}");
}
