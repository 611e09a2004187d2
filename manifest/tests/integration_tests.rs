use std::path::Path;

use cmdtree_core::Value;
use cmdtree_dispatch::{BufferSink, ReturnCode, run};
use cmdtree_manifest::{CommandManifest, Invocation, ManifestError, Recorder, build_command};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOOL_YAML: &str = r#"
name: tool
description: Build helper.
chain: true
options:
  - spec: "-v, --verbose"
    is_flag: true
    help: Print more.
commands:
  build:
    description: Build a target.
    options:
      - spec: "-j, --jobs"
        default: 1
    arguments:
      - name: target
        help: What to build.
  test:
    description: Run tests.
    options:
      - spec: "--tag"
        multiple: true
        default: [smoke]
  deploy:
    description: Ship it.
    exit_code: 9
"#;

fn write_manifest(dir: &Path, file: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

fn execute(manifest: &CommandManifest, raw: &[&str]) -> (ReturnCode, Vec<Invocation>, BufferSink) {
    let mut tool = build_command(manifest, &mut Recorder).unwrap();
    let mut seen: Vec<Invocation> = Vec::new();
    let mut sink = BufferSink::default();
    let tokens = raw.iter().map(|s| s.to_string()).collect();
    let code = run(tool.as_mut(), &manifest.name, tokens, &mut seen, &mut sink);
    (code, seen, sink)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(dir.path(), "tool.yml", TOOL_YAML);

    let manifest = CommandManifest::load(&path).unwrap();
    assert_eq!(manifest.name, "tool");
    assert_eq!(
        manifest.command_names().collect::<Vec<_>>(),
        vec!["build", "test", "deploy"]
    );
}

#[test]
fn test_yaml_and_json_build_the_same_tree() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = CommandManifest::from_yaml_str(TOOL_YAML).unwrap();
    let json_path = dir.path().join("tool.json");
    yaml.save(&json_path).unwrap();

    let json = CommandManifest::load(&json_path).unwrap();
    assert_eq!(json, yaml);

    let (code, seen, _) = execute(&json, &["build", "x"]);
    assert_eq!(code, ReturnCode::Success);
    assert_eq!(seen[0].values.option_str("jobs"), Some("1"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = CommandManifest::load(dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, ManifestError::IoError(_)));
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[test]
fn test_chain_from_manifest() {
    let manifest = CommandManifest::from_yaml_str(TOOL_YAML).unwrap();
    let (code, seen, _) = execute(
        &manifest,
        &["-v", "build", "-j", "4", "x", "test", "--tag", "unit"],
    );

    assert_eq!(code, ReturnCode::Success);
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].command, "tool build");
    assert_eq!(seen[0].values.option_str("jobs"), Some("4"));
    assert_eq!(seen[1].command, "tool test");
    assert_eq!(seen[1].values.option("tag"), Some(&Value::strings(["unit"])));
}

#[test]
fn test_chain_failure_stops_later_commands() {
    let manifest = CommandManifest::from_yaml_str(TOOL_YAML).unwrap();
    let (code, seen, _) = execute(&manifest, &["deploy", "test"]);

    assert_eq!(code, ReturnCode::Failure(9));
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].command, "tool deploy");
}

#[test]
fn test_default_tags_are_reported_when_unset() {
    let manifest = CommandManifest::from_yaml_str(TOOL_YAML).unwrap();
    let (_, seen, _) = execute(&manifest, &["test"]);
    assert_eq!(seen[0].values.option("tag"), Some(&Value::strings(["smoke"])));
}

#[test]
fn test_group_help_lists_commands_in_file_order() {
    let manifest = CommandManifest::from_yaml_str(TOOL_YAML).unwrap();
    let (code, seen, sink) = execute(&manifest, &["--help"]);

    assert_eq!(code, ReturnCode::Success);
    assert!(seen.is_empty());
    assert_eq!(
        sink.lines[0],
        "Usage: tool [OPTIONS] COMMAND1 [ARGS]... [COMMAND2 [ARGS]...]..."
    );
    let commands: Vec<&String> = sink
        .lines
        .iter()
        .skip_while(|line| *line != "Commands:")
        .skip(1)
        .collect();
    assert_eq!(
        commands,
        vec!["  build   Build a target.", "  test    Run tests.", "  deploy  Ship it."]
    );
}

#[test]
fn test_bad_option_spec_is_reported_with_path() {
    let manifest = CommandManifest::from_yaml_str(
        "name: tool\ncommands:\n  build:\n    options:\n      - spec: \"--jobs\"\n        nargs: 0\n",
    )
    .unwrap();

    let err = build_command(&manifest, &mut Recorder).err().unwrap();
    assert!(err.to_string().starts_with("command 'tool build': "));
}
