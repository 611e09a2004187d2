//! Error types for building and dispatching command trees.

use cmdtree_core::{DescriptorError, ParseError};
use thiserror::Error;

/// Errors raised while constructing commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// An option or argument spec failed to normalize.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    /// A subcommand was registered under an empty name.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two subcommands of one group share a name.
    #[error("duplicate command in group: {0}")]
    DuplicateCommand(String),
}

/// Reasons a command stops before (or instead of) running its action.
///
/// Every variant is reported to the user as `Error: <message>` after a
/// usage line, and maps to [`ReturnCode::FAILURE`](crate::ReturnCode::FAILURE).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// First error of the parse chain.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Tokens were left over and the command does not ignore them.
    #[error("unexpected extra argument(s): {}", .0.join(" "))]
    UnexpectedExtraArguments(Vec<String>),
    /// A group ran out of tokens before a subcommand name.
    #[error("missing command")]
    MissingCommand,
    /// A group was given a name it has no command for.
    #[error("no such command: {0}")]
    NoSuchCommand(String),
}
