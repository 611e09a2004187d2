//! Declarative command-tree manifests.
//!
//! A manifest describes one command node and, recursively, its subcommands.
//! Nodes with a `commands` map become groups; all others are leaves.
//!
//! # Example YAML
//!
//! ```yaml
//! name: tool
//! description: Build helper.
//! chain: true
//! options:
//!   - spec: "-v, --verbose"
//!     is_flag: true
//! commands:
//!   build:
//!     description: Build a target.
//!     arguments:
//!       - name: target
//!   test:
//!     description: Run tests.
//!     options:
//!       - spec: "--tag"
//!         multiple: true
//!     arguments:
//!       - name: filters
//!         nargs: -1
//! ```
//!
//! Subcommands keep the order in which they appear in the file; help output
//! lists them the same way.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use cmdtree_core::{ArgumentSpec, OptionSpec, Parser};
use cmdtree_dispatch::NodeConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ManifestError, Result};

/// One command node as written in a manifest file.
///
/// # Examples
///
/// ```
/// use cmdtree_manifest::CommandManifest;
///
/// let manifest = CommandManifest::from_yaml_str(
///     "name: tool\ncommands:\n  build: {}\n  test: {}\n",
/// )?;
/// assert!(manifest.is_group());
/// assert_eq!(manifest.command_names().collect::<Vec<_>>(), vec!["build", "test"]);
/// # Ok::<(), cmdtree_manifest::ManifestError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandManifest {
    /// Program name; only read on the root node; subcommands are named by
    /// their key in the parent's `commands` map.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Run several subcommands per invocation.
    #[serde(default)]
    pub chain: bool,
    #[serde(default)]
    pub ignore_extra_arguments: bool,
    /// Aliases of the builtin help flag, `--help` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_aliases: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSpec>,
    /// Code returned by the default leaf action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, with = "ordered_commands", skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<(String, CommandManifest)>,
}

impl CommandManifest {
    /// Loads a manifest, choosing JSON for `.json` files and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ManifestError::IoError) if the file cannot be
    /// read, or a JSON/YAML error if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(manifest)
    }

    /// Saves the manifest in the format implied by the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ManifestError::IoError) if the file cannot be
    /// written, or a JSON/YAML error if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns `true` if this node dispatches to subcommands.
    pub fn is_group(&self) -> bool {
        !self.commands.is_empty()
    }

    pub fn command(&self, name: &str) -> Option<&CommandManifest> {
        self.commands
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, command)| command)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(name, _)| name.as_str())
    }

    /// Walks down the tree along `path` (subcommand names, root excluded).
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCommand`](ManifestError::UnknownCommand) naming the
    /// full path when a segment does not exist.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<&CommandManifest> {
        let mut node = self;
        for (depth, segment) in path.iter().enumerate() {
            node = node.command(segment.as_ref()).ok_or_else(|| {
                let walked: Vec<&str> = path[..=depth].iter().map(AsRef::as_ref).collect();
                ManifestError::UnknownCommand(format!("{} {}", self.name, walked.join(" ")))
            })?;
        }
        Ok(node)
    }

    /// The node's own declarations, ready for a dispatcher.
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            description: self.description.clone(),
            options: self.options.clone(),
            arguments: self.arguments.clone(),
            help_aliases: self.help_aliases.clone(),
            ignore_extra_arguments: self.ignore_extra_arguments,
        }
    }

    /// A bare parser over this node's options and arguments, without the
    /// builtin help flag.
    ///
    /// # Errors
    ///
    /// Returns [`Build`](ManifestError::Build) if a spec is invalid.
    pub fn parser(&self) -> Result<Parser> {
        Parser::from_specs(self.options.clone(), self.arguments.clone()).map_err(|e| {
            ManifestError::Build {
                path: self.name.clone(),
                source: e.into(),
            }
        })
    }

    /// Full paths (`tool build`) of every leaf, depth first.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaves(self, &self.name, &mut paths);
        paths
    }

    /// Checks the tree shape: the root needs a name, subcommand names must be
    /// non-empty, unique among siblings and must not look like options.
    ///
    /// Option and argument specs are checked when the tree is built.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::InvalidManifest(
                "root command has no name".into(),
            ));
        }
        validate_node(self, &self.name)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn collect_leaves(node: &CommandManifest, path: &str, out: &mut Vec<String>) {
    if !node.is_group() {
        out.push(path.to_string());
        return;
    }
    for (name, child) in &node.commands {
        collect_leaves(child, &format!("{path} {name}"), out);
    }
}

fn validate_node(node: &CommandManifest, path: &str) -> Result<()> {
    if node.chain && !node.is_group() {
        warn!(command = %path, "Ignoring chain on a command without subcommands");
    }

    let mut seen = std::collections::HashSet::new();
    for (name, child) in &node.commands {
        if name.trim().is_empty() {
            return Err(ManifestError::InvalidManifest(format!(
                "empty command name under '{path}'"
            )));
        }
        if name.starts_with('-') {
            return Err(ManifestError::InvalidManifest(format!(
                "command name '{name}' under '{path}' looks like an option"
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(ManifestError::InvalidManifest(format!(
                "duplicate command '{name}' under '{path}'"
            )));
        }
        validate_node(child, &format!("{path} {name}"))?;
    }
    Ok(())
}

/// Serializes `commands` as a map while keeping file order.
mod ordered_commands {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::CommandManifest;

    pub fn serialize<S: Serializer>(
        commands: &[(String, CommandManifest)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(commands.len()))?;
        for (name, command) in commands {
            map.serialize_entry(name, command)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, CommandManifest)>, D::Error> {
        deserializer.deserialize_map(CommandsVisitor)
    }

    struct CommandsVisitor;

    impl<'de> Visitor<'de> for CommandsVisitor {
        type Value = Vec<(String, CommandManifest)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of command names to commands")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut commands = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, CommandManifest>()? {
                commands.push(entry);
            }
            Ok(commands)
        }
    }
}
