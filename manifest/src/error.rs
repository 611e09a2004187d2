//! Error types for manifest loading and command-tree construction.

use cmdtree_dispatch::BuildError;
use thiserror::Error;

/// Errors that can occur while reading a manifest or building its commands.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Structural problem such as an empty or duplicate command name.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A node's option/argument specs were rejected.
    #[error("command '{path}': {source}")]
    Build {
        path: String,
        #[source]
        source: BuildError,
    },

    /// No command exists at the requested path.
    #[error("no such command: {0}")]
    UnknownCommand(String),
}

/// Convenience alias for results with [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;
