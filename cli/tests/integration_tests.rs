use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("cmdtree_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const TOOL_YAML: &str = r#"name: tool
description: Build helper.
chain: true
options:
  - spec: "-v, --verbose"
    is_flag: true
commands:
  build:
    description: Build a target.
    arguments:
      - name: target
  test:
    description: Run tests.
    options:
      - spec: "--tag"
        multiple: true
  deploy:
    description: Ship it.
    exit_code: 9
"#;

fn write_manifest(dir: &TempDir, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, contents).expect("failed to write manifest");
    path
}

fn cmdtree(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_cmdtree"))
        .args(args)
        .output()
        .expect("failed to run cmdtree")
}

fn stdout_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is not JSON"))
        .collect()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_prints_one_record_per_leaf() {
    let dir = TempDir::new("run_chain");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&[
        "run",
        "--manifest",
        manifest.to_str().unwrap(),
        "--",
        "build",
        "x",
        "test",
        "--tag",
        "a",
        "--tag",
        "b",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let records = stdout_lines(&output);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["command"], "tool build");
    assert_eq!(records[0]["arguments"]["target"], "x");
    assert_eq!(records[1]["command"], "tool test");
    assert_eq!(records[1]["options"]["tag"], serde_json::json!(["a", "b"]));
}

#[test]
fn run_exit_status_follows_leaf_code() {
    let dir = TempDir::new("run_exit");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&[
        "run",
        "--manifest",
        manifest.to_str().unwrap(),
        "--",
        "deploy",
        "build",
        "x",
    ]);

    assert_eq!(output.status.code(), Some(9));
    let records = stdout_lines(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["command"], "tool deploy");
}

#[test]
fn run_reports_parse_errors_with_usage() {
    let dir = TempDir::new("run_bogus");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&[
        "run",
        "--manifest",
        manifest.to_str().unwrap(),
        "--",
        "--bogus",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: tool [OPTIONS] COMMAND1 [ARGS]..."));
    assert!(stderr.contains("Error: no such option: --bogus"));
    assert!(output.stdout.is_empty());
}

#[test]
fn run_without_tokens_shows_group_help() {
    let dir = TempDir::new("run_empty");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&["run", "--manifest", manifest.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Usage: tool [OPTIONS]"));
    assert!(stdout.contains("  deploy  Ship it."));
}

#[test]
fn run_accepts_json_manifest() {
    let dir = TempDir::new("run_json");
    let json = serde_json::json!({
        "name": "greet",
        "options": [{"spec": "-n, --name", "required": true}]
    });
    let manifest = write_manifest(&dir, "greet.json", &json.to_string());

    let output = cmdtree(&[
        "run",
        "--manifest",
        manifest.to_str().unwrap(),
        "--",
        "-n",
        "ann",
    ]);

    assert!(output.status.success());
    let records = stdout_lines(&output);
    assert_eq!(records[0]["command"], "greet");
    assert_eq!(records[0]["options"]["name"], "ann");
}

// ---------------------------------------------------------------------------
// check / help
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_manifest() {
    let dir = TempDir::new("check_ok");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&["check", "--manifest", manifest.to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "Manifest 'tool' OK: 3 leaf command(s)."
    );
}

#[test]
fn check_rejects_two_variadic_arguments() {
    let dir = TempDir::new("check_variadic");
    let manifest = write_manifest(
        &dir,
        "tool.yml",
        "name: tool\narguments:\n  - {name: a, nargs: -1}\n  - {name: b, nargs: -1}\n",
    );

    let output = cmdtree(&["check", "--manifest", manifest.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: command 'tool': "));
}

#[test]
fn check_reports_missing_file() {
    let dir = TempDir::new("check_missing");
    let output = cmdtree(&["check", "--manifest", dir.join("absent.yml").to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load manifest"));
}

#[test]
fn help_prints_subcommand_page() {
    let dir = TempDir::new("help_sub");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&["help", "--manifest", manifest.to_str().unwrap(), "build"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Usage: tool build [OPTIONS] TARGET");
    assert_eq!(lines[2], "  Build a target.");
}

#[test]
fn help_rejects_unknown_path() {
    let dir = TempDir::new("help_unknown");
    let manifest = write_manifest(&dir, "tool.yml", TOOL_YAML);

    let output = cmdtree(&["help", "--manifest", manifest.to_str().unwrap(), "ship"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no such command: tool ship"));
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

const PARSE_YAML: &str = r#"name: copy
options:
  - spec: "--src"
    required: true
  - spec: "--dst"
    required: true
  - spec: "-f, --force / --no-force"
arguments:
  - name: files
    nargs: -1
"#;

#[test]
fn parse_prints_values() {
    let dir = TempDir::new("parse_values");
    let manifest = write_manifest(&dir, "copy.yml", PARSE_YAML);

    let output = cmdtree(&[
        "parse",
        "--manifest",
        manifest.to_str().unwrap(),
        "--",
        "--src",
        "a",
        "--dst",
        "b",
        "--no-force",
        "x",
        "y",
    ]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["values"]["options"]["src"], "a");
    assert_eq!(report["values"]["options"]["force"], false);
    assert_eq!(report["values"]["arguments"]["files"], serde_json::json!(["x", "y"]));
}

#[test]
fn parse_aggregate_reports_every_missing_option() {
    let dir = TempDir::new("parse_aggregate");
    let manifest = write_manifest(&dir, "copy.yml", PARSE_YAML);

    let fail_fast = cmdtree(&["parse", "--manifest", manifest.to_str().unwrap()]);
    let aggregate = cmdtree(&["parse", "--manifest", manifest.to_str().unwrap(), "--aggregate"]);

    assert!(!fail_fast.status.success());
    assert!(!aggregate.status.success());

    let fail_fast: serde_json::Value = serde_json::from_slice(&fail_fast.stdout).unwrap();
    let aggregate: serde_json::Value = serde_json::from_slice(&aggregate.stdout).unwrap();
    assert_eq!(fail_fast["errors"].as_array().unwrap().len(), 1);
    assert_eq!(
        aggregate["errors"],
        serde_json::json!([
            "missing required option: --src",
            "missing required option: --dst"
        ])
    );
}
