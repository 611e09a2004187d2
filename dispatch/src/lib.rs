//! Command trees on top of [`cmdtree_core`].
//!
//! Every node implements [`Command`]. A [`LeafCommand`] parses its own
//! options and arguments and hands the values to a callback; a
//! [`CommandGroup`] parses its own options, then resolves the next token to a
//! registered subcommand and recurses, once or (in chain mode) repeatedly.
//!
//! Each node wraps a [`Dispatcher`], which owns the node's parser plus the
//! builtin help flag and carries unconsumed tokens between parent and child.
//! Output goes through a [`Sink`]; return codes are [`ReturnCode`] values
//! whose failures propagate unchanged to the root.
//!
//! # Example
//!
//! ```
//! use cmdtree_core::ArgumentSpec;
//! use cmdtree_dispatch::{BufferSink, CommandGroup, LeafCommand, ReturnCode, run};
//!
//! let step = |name: &'static str| {
//!     LeafCommand::<Vec<String>>::builder()
//!         .argument(ArgumentSpec::new("target"))
//!         .action(move |frame, values| {
//!             let target = values.argument_str("target").unwrap_or_default();
//!             frame.context.push(format!("{name} {target}"));
//!         })
//!         .build()
//! };
//!
//! let mut tool = CommandGroup::builder()
//!     .chain(true)
//!     .command("build", step("build")?)
//!     .command("test", step("test")?)
//!     .build()?;
//!
//! let mut seen = Vec::new();
//! let mut sink = BufferSink::default();
//! let tokens = ["build", "x", "test", "y"].map(String::from).to_vec();
//! let code = run(&mut tool, "tool", tokens, &mut seen, &mut sink);
//!
//! assert_eq!(code, ReturnCode::Success);
//! assert_eq!(seen, vec!["build x", "test y"]);
//! # Ok::<(), cmdtree_dispatch::BuildError>(())
//! ```

mod code;
mod command;
mod dispatch;
mod error;
mod group;
pub mod help;
mod leaf;
mod sink;

pub use code::ReturnCode;
pub use command::{Command, Frame, run};
pub use dispatch::{
    DEFAULT_HELP_ALIASES, Dispatch, DispatchState, Dispatcher, HELP_OPTION, NodeConfig, report,
    report_halt,
};
pub use error::{BuildError, DispatchError};
pub use group::{CommandGroup, GroupBuilder};
pub use leaf::{LeafBuilder, LeafCommand};
pub use sink::{BufferSink, Sink, StdioSink};
