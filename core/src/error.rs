//! Error types for descriptor construction and token parsing.
//!
//! Construction problems ([`DescriptorError`]) are returned as `Err` from the
//! normalizer and from [`Parser::new`](crate::Parser::new). Parse problems
//! ([`ParseError`]) never abort a call: they are appended, in encounter
//! order, to the [`ErrorChain`] carried by the parsing context.

use std::fmt;

use thiserror::Error;

/// Errors raised while normalizing option/argument specs into descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The option spec contains no `-x` or `--long` alias.
    #[error("option spec declares no aliases: '{0}'")]
    NoAliases(String),
    /// A valued option was declared with `nargs <= 0`.
    #[error("option '{name}' must take at least one value (nargs={nargs})")]
    InvalidOptionNargs { name: String, nargs: i64 },
    /// A `multiple` option was given a default that is not a list.
    #[error("multiple option '{0}' requires a list default")]
    NonListDefault(String),
    /// An argument spec has an empty name.
    #[error("argument name cannot be empty")]
    MissingArgumentName,
    /// An argument was declared with `nargs == 0`.
    #[error("argument '{0}' cannot take zero values")]
    ZeroArgumentNargs(String),
    /// Two arguments in one parser are variadic.
    #[error("argument '{second}' is variadic but '{first}' already is")]
    DuplicateVariadic { first: String, second: String },
    /// The same alias is declared by more than one option.
    #[error("duplicate option alias: {0}")]
    DuplicateAlias(String),
    /// Two options resolve to the same value-map key.
    #[error("duplicate option name: {0}")]
    DuplicateOption(String),
    /// Two arguments share a name.
    #[error("duplicate argument name: {0}")]
    DuplicateArgument(String),
}

/// A single parse error record.
///
/// # Examples
///
/// ```
/// use cmdtree_core::ParseError;
///
/// let err = ParseError::InvalidOption { token: "--bogus".into() };
/// assert_eq!(err.to_string(), "no such option: --bogus");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `-`-prefixed token matched no alias.
    #[error("no such option: {token}")]
    InvalidOption { token: String },
    /// A required option was absent (or accumulated an empty list).
    #[error("missing required option: {option}")]
    MissingOption {
        /// Descriptor name (value-map key).
        name: String,
        /// Alias shown to the user.
        option: String,
    },
    /// An option or argument needed more tokens than remained.
    #[error("{target} expects {expected} value(s), got {}", received.len())]
    InadequateArguments {
        /// Descriptor name (value-map key).
        name: String,
        /// Alias or metavar shown to the user.
        target: String,
        expected: usize,
        received: Vec<String>,
    },
}

impl ParseError {
    /// Descriptor name the error refers to, if any.
    pub fn descriptor(&self) -> Option<&str> {
        match self {
            ParseError::InvalidOption { .. } => None,
            ParseError::MissingOption { name, .. }
            | ParseError::InadequateArguments { name, .. } => Some(name),
        }
    }
}

/// Ordered parse errors, first to last.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{ErrorChain, ParseError};
///
/// let mut chain = ErrorChain::default();
/// chain.push(ParseError::InvalidOption { token: "-x".into() });
/// chain.push(ParseError::InvalidOption { token: "-y".into() });
///
/// assert_eq!(chain.len(), 2);
/// assert_eq!(chain.first(), Some(&ParseError::InvalidOption { token: "-x".into() }));
/// assert_eq!(chain.last(), Some(&ParseError::InvalidOption { token: "-y".into() }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorChain {
    errors: Vec<ParseError>,
}

impl ErrorChain {
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn last(&self) -> Option<&ParseError> {
        self.errors.last()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ErrorChain {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorChain {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorChain {}
