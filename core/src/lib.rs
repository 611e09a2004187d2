//! Descriptors and the token parsing engine behind `cmdtree`.
//!
//! This crate turns declarative option/argument specs into validated values:
//!
//! - [`OptionSpec`] / [`ArgumentSpec`]: loose declarations as written by a
//!   command author (or loaded from a manifest).
//! - [`OptionDescriptor`] / [`ArgumentDescriptor`]: canonical forms built
//!   once per command.
//! - [`Parser`]: consumes a token array against a descriptor set, producing
//!   [`ParsedValues`] or an [`ErrorChain`].
//!
//! Construction problems surface as [`DescriptorError`]; parse problems are
//! [`ParseError`] records collected in order.
//!
//! # Example
//!
//! ```
//! use cmdtree_core::*;
//!
//! let parser = Parser::from_specs(
//!     [
//!         OptionSpec::new("-s, --shout / --no-shout"),
//!         OptionSpec::new("-n, --name").required(),
//!     ],
//!     [ArgumentSpec::new("words").nargs(-1)],
//! )?;
//!
//! let tokens: Vec<String> = ["--name", "bob", "-s", "hi", "there"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let parsed = parser.parse(&tokens).unwrap();
//! assert!(parsed.values.flag("shout"));
//! assert_eq!(parsed.values.option_str("name"), Some("bob"));
//! assert_eq!(parsed.values.argument("words"), Some(&Value::strings(["hi", "there"])));
//!
//! let errors = parser.parse(&[]).unwrap_err();
//! assert!(matches!(errors.first(), Some(ParseError::MissingOption { .. })));
//! # Ok::<(), DescriptorError>(())
//! ```

mod descriptor;
mod error;
mod parser;
mod validate;
mod value;

pub use descriptor::{
    AliasMatch, ArgumentDescriptor, ArgumentSpec, Arity, OptionDescriptor, OptionKind, OptionSpec,
};
pub use error::{DescriptorError, ErrorChain, ParseError};
pub use parser::{END_OF_OPTIONS, OptionStep, Parsed, Parser, ParsingContext};
pub use validate::{resolve_arities, validate_arguments, validate_options};
pub use value::{ParsedValues, Value};
