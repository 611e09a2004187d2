//! Turning manifests into executable command trees.
//!
//! Groups are built directly from the manifest. Leaf behavior comes from an
//! [`ActionResolver`], asked once per leaf with the leaf's full path
//! (`tool build`). Leaves the resolver does not know fall back to the
//! manifest's `exit_code` (success when absent).
//!
//! [`Recorder`] is a resolver that logs every leaf execution as an
//! [`Invocation`], which is what the `cmdtree` binary prints.

use cmdtree_core::ParsedValues;
use cmdtree_dispatch::{Command, CommandGroup, Frame, LeafCommand, ReturnCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ManifestError, Result};
use crate::manifest::CommandManifest;

/// Boxed leaf callback.
pub type LeafAction<C> = Box<dyn FnMut(&mut Frame<'_, C>, &ParsedValues) -> ReturnCode>;

/// Supplies the callback for each leaf of a manifest.
pub trait ActionResolver<C> {
    /// Returns the action for the leaf at `path`, or `None` to use the
    /// manifest's `exit_code`.
    fn resolve(&mut self, path: &str, manifest: &CommandManifest) -> Option<LeafAction<C>>;
}

impl<C, F> ActionResolver<C> for F
where
    F: FnMut(&str, &CommandManifest) -> Option<LeafAction<C>>,
{
    fn resolve(&mut self, path: &str, manifest: &CommandManifest) -> Option<LeafAction<C>> {
        self(path, manifest)
    }
}

/// One executed leaf: its path and the values it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub command: String,
    #[serde(flatten)]
    pub values: ParsedValues,
}

/// Resolver whose actions push an [`Invocation`] onto the context and then
/// return the leaf's `exit_code`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recorder;

impl ActionResolver<Vec<Invocation>> for Recorder {
    fn resolve(
        &mut self,
        path: &str,
        manifest: &CommandManifest,
    ) -> Option<LeafAction<Vec<Invocation>>> {
        let command = path.to_string();
        let code = ReturnCode::from(manifest.exit_code);
        Some(Box::new(
            move |frame: &mut Frame<'_, Vec<Invocation>>, values: &ParsedValues| {
                frame.context.push(Invocation {
                    command: command.clone(),
                    values: values.clone(),
                });
                code
            },
        ))
    }
}

/// Validates `manifest` and builds its command tree.
///
/// # Errors
///
/// Returns [`InvalidManifest`](ManifestError::InvalidManifest) for a
/// malformed tree and [`Build`](ManifestError::Build), naming the command
/// path, for rejected option/argument specs.
///
/// # Examples
///
/// ```
/// use cmdtree_dispatch::{BufferSink, ReturnCode, run};
/// use cmdtree_manifest::{CommandManifest, Invocation, Recorder, build_command};
///
/// let manifest = CommandManifest::from_yaml_str(
///     "name: tool\ncommands:\n  build:\n    arguments:\n      - name: target\n",
/// )?;
/// let mut tool = build_command(&manifest, &mut Recorder)?;
///
/// let mut seen: Vec<Invocation> = Vec::new();
/// let mut sink = BufferSink::default();
/// let tokens = vec!["build".to_string(), "x".to_string()];
/// let code = run(tool.as_mut(), "tool", tokens, &mut seen, &mut sink);
///
/// assert_eq!(code, ReturnCode::Success);
/// assert_eq!(seen[0].command, "tool build");
/// assert_eq!(seen[0].values.argument_str("target"), Some("x"));
/// # Ok::<(), cmdtree_manifest::ManifestError>(())
/// ```
pub fn build_command<C: 'static>(
    manifest: &CommandManifest,
    resolver: &mut dyn ActionResolver<C>,
) -> Result<Box<dyn Command<C>>> {
    manifest.validate()?;
    let command = build_node(manifest, &manifest.name, resolver)?;
    debug!(
        program = %manifest.name,
        leaves = manifest.leaf_paths().len(),
        "Built command tree from manifest"
    );
    Ok(command)
}

fn build_node<C: 'static>(
    node: &CommandManifest,
    path: &str,
    resolver: &mut dyn ActionResolver<C>,
) -> Result<Box<dyn Command<C>>> {
    let build_error = |source| ManifestError::Build {
        path: path.to_string(),
        source,
    };

    if node.is_group() {
        let mut builder = CommandGroup::builder()
            .config(node.node_config())
            .chain(node.chain);
        for (name, child) in &node.commands {
            let child = build_node(child, &format!("{path} {name}"), resolver)?;
            builder = builder.boxed_command(name, child);
        }
        let group = builder.build().map_err(build_error)?;
        return Ok(Box::new(group));
    }

    let action = resolver.resolve(path, node).unwrap_or_else(|| {
        let code = ReturnCode::from(node.exit_code);
        Box::new(move |_: &mut Frame<'_, C>, _: &ParsedValues| code)
    });
    let leaf = LeafCommand::builder()
        .config(node.node_config())
        .action(action)
        .build()
        .map_err(build_error)?;
    Ok(Box::new(leaf))
}

#[cfg(test)]
mod tests {
    use cmdtree_core::Value;
    use cmdtree_dispatch::{BufferSink, run};

    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn execute(manifest: &CommandManifest, raw: &[&str]) -> (ReturnCode, Vec<Invocation>) {
        let mut command = build_command(manifest, &mut Recorder).unwrap();
        let mut seen: Vec<Invocation> = Vec::new();
        let mut sink = BufferSink::default();
        let code = run(command.as_mut(), &manifest.name, tokens(raw), &mut seen, &mut sink);
        (code, seen)
    }

    #[test]
    fn test_chain_manifest_records_in_order() {
        let manifest = CommandManifest::from_yaml_str(
            r#"
name: tool
chain: true
commands:
  build:
    arguments: [{name: target}]
  test:
    arguments: [{name: target}]
"#,
        )
        .unwrap();

        let (code, seen) = execute(&manifest, &["build", "x", "test", "y"]);
        assert_eq!(code, ReturnCode::Success);
        let commands: Vec<&str> = seen.iter().map(|i| i.command.as_str()).collect();
        assert_eq!(commands, vec!["tool build", "tool test"]);
        assert_eq!(seen[1].values.argument_str("target"), Some("y"));
    }

    #[test]
    fn test_exit_code_propagates() {
        let manifest = CommandManifest::from_yaml_str(
            "name: tool\ncommands:\n  deploy:\n    commands:\n      push:\n        exit_code: 4\n",
        )
        .unwrap();

        let (code, seen) = execute(&manifest, &["deploy", "push"]);
        assert_eq!(code, ReturnCode::Failure(4));
        assert_eq!(seen[0].command, "tool deploy push");
    }

    #[test]
    fn test_invalid_spec_names_command_path() {
        let manifest = CommandManifest::from_yaml_str(
            r#"
name: tool
commands:
  copy:
    arguments:
      - {name: src, nargs: -1}
      - {name: dst, nargs: -1}
"#,
        )
        .unwrap();

        let err = build_command(&manifest, &mut Recorder).err().unwrap();
        assert!(matches!(&err, ManifestError::Build { path, .. } if path == "tool copy"));
    }

    #[test]
    fn test_closure_resolver_overrides_some_leaves() {
        let manifest = CommandManifest::from_yaml_str(
            "name: tool\ncommands:\n  ok: {}\n  fail: {exit_code: 2}\n",
        )
        .unwrap();

        let mut resolver = |path: &str, _: &CommandManifest| -> Option<LeafAction<Vec<String>>> {
            if path != "tool ok" {
                return None;
            }
            Some(Box::new(|frame: &mut Frame<'_, Vec<String>>, _: &ParsedValues| {
                frame.context.push("ran".into());
                ReturnCode::Success
            }))
        };
        let mut command = build_command::<Vec<String>>(&manifest, &mut resolver).unwrap();

        let mut seen = Vec::new();
        let mut sink = BufferSink::default();
        assert_eq!(
            run(command.as_mut(), "tool", tokens(&["ok"]), &mut seen, &mut sink),
            ReturnCode::Success
        );
        assert_eq!(seen, vec!["ran"]);
        assert_eq!(
            run(command.as_mut(), "tool", tokens(&["fail"]), &mut seen, &mut sink),
            ReturnCode::Failure(2)
        );
    }

    #[test]
    fn test_invocation_serializes_flat() {
        let mut values = ParsedValues::default();
        values.options.insert("tag".into(), Value::strings(["a"]));
        let invocation = Invocation {
            command: "tool test".into(),
            values,
        };
        assert_eq!(
            serde_json::to_string(&invocation).unwrap(),
            r#"{"command":"tool test","options":{"tag":["a"]},"arguments":{}}"#
        );
    }
}
