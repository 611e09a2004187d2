//! Single-pass token parser.
//!
//! A [`Parser`] holds an immutable descriptor set. Each invocation creates a
//! fresh [`ParsingContext`] with [`Parser::start_parsing`] and drives it
//! through three phases:
//!
//! 1. [`Parser::parse_next_option`], repeatedly, while tokens look like
//!    options (start with `-`). A bare `--` ends this phase.
//! 2. [`Parser::parse_arguments`] over the rest of the stream.
//! 3. [`Parser::finish_parsing`], which checks required options.
//!
//! Tokens left after phase 2 are returned to the caller untouched; command
//! groups feed them to subcommands.
//!
//! # Defaults
//!
//! The context starts with every descriptor's default *borrowed* from the
//! parser. Nothing is copied unless the option is actually given. For
//! `multiple` options the first occurrence replaces the borrowed list with a
//! freshly allocated one; later occurrences append to that new list. The
//! descriptor's default is never written to, so repeated invocations of the
//! same parser cannot observe each other's values.
//!
//! # Errors
//!
//! Errors are appended to the context's [`ErrorChain`]. With
//! `finish_on_error` (the default) the first error halts every later phase;
//! without it parsing keeps going so that all problems, including every
//! missing required option, are collected.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::descriptor::{
    AliasMatch, ArgumentDescriptor, ArgumentSpec, Arity, OptionDescriptor, OptionSpec,
};
use crate::error::{DescriptorError, ErrorChain, ParseError};
use crate::validate::{resolve_arities, validate_arguments, validate_options};
use crate::value::{ParsedValues, Value};

/// Token that ends option scanning.
pub const END_OF_OPTIONS: &str = "--";

/// Result of one [`Parser::parse_next_option`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionStep<'p> {
    /// An option matched; `value` is what this occurrence contributed.
    Matched { name: &'p str, value: Value },
    /// The token was rejected and an error recorded.
    Rejected,
    /// Option scanning is over.
    Done,
}

/// Per-invocation parse state.
#[derive(Debug, Clone)]
pub struct ParsingContext<'p> {
    option_values: BTreeMap<&'p str, Cow<'p, Value>>,
    arguments: BTreeMap<&'p str, Value>,
    /// `multiple` options still holding the parser's shared default list.
    untouched_defaults: BTreeSet<&'p str>,
    errors: ErrorChain,
    finished: bool,
    finish_on_error: bool,
}

impl<'p> ParsingContext<'p> {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.option_values.get(name).map(|v| v.as_ref())
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn errors(&self) -> &ErrorChain {
        &self.errors
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish_on_error(&self) -> bool {
        self.finish_on_error
    }

    /// Switches between fail-fast (`true`) and aggregate (`false`) modes.
    pub fn set_finish_on_error(&mut self, finish_on_error: bool) {
        self.finish_on_error = finish_on_error;
    }

    /// Returns `true` while `name` still holds the shared default list.
    pub fn is_untouched_default(&self, name: &str) -> bool {
        self.untouched_defaults.contains(name)
    }

    /// Whether later phases must stop because of a recorded error.
    fn halted(&self) -> bool {
        self.finish_on_error && !self.errors.is_empty()
    }

    fn record(&mut self, error: ParseError) {
        debug!(error = %error, "Recorded parse error");
        self.errors.push(error);
    }

    fn assign(&mut self, option: &'p OptionDescriptor, value: Value) {
        let name = option.name.as_str();
        if !option.multiple {
            self.option_values.insert(name, Cow::Owned(value));
            return;
        }

        if self.untouched_defaults.remove(name) {
            self.option_values
                .insert(name, Cow::Owned(Value::List(vec![value])));
            return;
        }

        match self.option_values.get_mut(name).map(Cow::to_mut) {
            Some(Value::List(items)) => items.push(value),
            Some(other) => {
                let previous = std::mem::replace(other, Value::empty_list());
                *other = Value::List(vec![previous, value]);
            }
            None => {
                self.option_values
                    .insert(name, Cow::Owned(Value::List(vec![value])));
            }
        }
    }

    /// Converts into owned value maps, copying any defaults still borrowed.
    pub fn into_values(self) -> ParsedValues {
        ParsedValues {
            options: self
                .option_values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.into_owned()))
                .collect(),
            arguments: self
                .arguments
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// Consumes the context, returning its error chain.
    pub fn into_errors(self) -> ErrorChain {
        self.errors
    }
}

/// Successful result of [`Parser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub values: ParsedValues,
    /// Tokens no descriptor consumed.
    pub rest: Vec<String>,
}

/// Immutable descriptor set plus the parsing operations over it.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{ArgumentSpec, OptionSpec, Parser, Value};
///
/// let parser = Parser::from_specs(
///     [OptionSpec::new("-v, --verbose").flag(), OptionSpec::new("--tag").multiple()],
///     [ArgumentSpec::new("files").nargs(-1)],
/// )?;
///
/// let tokens: Vec<String> = ["-v", "--tag", "a", "x.txt", "y.txt"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let parsed = parser.parse(&tokens).unwrap();
///
/// assert!(parsed.values.flag("verbose"));
/// assert_eq!(parsed.values.option("tag"), Some(&Value::strings(["a"])));
/// assert_eq!(parsed.values.argument("files"), Some(&Value::strings(["x.txt", "y.txt"])));
/// assert!(parsed.rest.is_empty());
/// # Ok::<(), cmdtree_core::DescriptorError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: Vec<OptionDescriptor>,
    arguments: Vec<ArgumentDescriptor>,
}

impl Parser {
    /// Builds a parser from normalized descriptors.
    ///
    /// # Errors
    ///
    /// Fails on alias collisions, duplicate names, or a second variadic
    /// argument.
    pub fn new(
        options: Vec<OptionDescriptor>,
        mut arguments: Vec<ArgumentDescriptor>,
    ) -> Result<Self, DescriptorError> {
        validate_options(&options)?;
        validate_arguments(&arguments)?;
        resolve_arities(&mut arguments)?;
        Ok(Self { options, arguments })
    }

    /// Normalizes loose specs and builds a parser.
    pub fn from_specs(
        options: impl IntoIterator<Item = OptionSpec>,
        arguments: impl IntoIterator<Item = ArgumentSpec>,
    ) -> Result<Self, DescriptorError> {
        let options = options
            .into_iter()
            .map(OptionDescriptor::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let arguments = arguments
            .into_iter()
            .map(ArgumentDescriptor::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(options, arguments)
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    pub fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    pub fn find_option(&self, name: &str) -> Option<&OptionDescriptor> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Creates a fresh context populated with descriptor defaults.
    pub fn start_parsing(&self) -> ParsingContext<'_> {
        let mut option_values = BTreeMap::new();
        let mut untouched_defaults = BTreeSet::new();

        for option in &self.options {
            if let Some(default) = &option.default {
                option_values.insert(option.name.as_str(), Cow::Borrowed(default));
                if option.multiple {
                    untouched_defaults.insert(option.name.as_str());
                }
            }
        }

        ParsingContext {
            option_values,
            arguments: BTreeMap::new(),
            untouched_defaults,
            errors: ErrorChain::default(),
            finished: false,
            finish_on_error: true,
        }
    }

    /// Consumes one option (plus its values) at `cursor`.
    ///
    /// Returns the advanced cursor and what happened. Once this returns
    /// [`OptionStep::Done`] the cursor points at the first positional token.
    pub fn parse_next_option<'p>(
        &'p self,
        ctx: &mut ParsingContext<'p>,
        tokens: &[String],
        cursor: usize,
    ) -> (usize, OptionStep<'p>) {
        if ctx.halted() {
            return (cursor, OptionStep::Done);
        }
        let Some(token) = tokens.get(cursor) else {
            return (cursor, OptionStep::Done);
        };
        if token == END_OF_OPTIONS {
            return (cursor + 1, OptionStep::Done);
        }
        if !token.starts_with('-') {
            return (cursor, OptionStep::Done);
        }

        let Some((option, hit)) = self
            .options
            .iter()
            .find_map(|option| option.matches(token).map(|hit| (option, hit)))
        else {
            ctx.record(ParseError::InvalidOption {
                token: token.clone(),
            });
            return (cursor + 1, OptionStep::Rejected);
        };

        let (next, value) = match hit {
            AliasMatch::On => (cursor + 1, Value::Bool(true)),
            AliasMatch::Off => (cursor + 1, Value::Bool(false)),
            AliasMatch::Valued(nargs) => {
                let start = cursor + 1;
                let end = (start + nargs).min(tokens.len());
                let received = &tokens[start..end];
                if received.len() < nargs {
                    ctx.record(ParseError::InadequateArguments {
                        name: option.name.clone(),
                        target: option.display_alias().to_string(),
                        expected: nargs,
                        received: received.to_vec(),
                    });
                }
                let value = if nargs == 1 {
                    match received.first() {
                        Some(token) => Value::Str(token.clone()),
                        None => return (end, OptionStep::Rejected),
                    }
                } else {
                    Value::strings(received.iter().cloned())
                };
                (end, value)
            }
        };

        trace!(option = %option.name, ?value, "Matched option");
        ctx.assign(option, value.clone());
        (
            next,
            OptionStep::Matched {
                name: &option.name,
                value,
            },
        )
    }

    /// Runs [`parse_next_option`](Self::parse_next_option) until scanning
    /// ends, returning the cursor of the first positional token.
    pub fn parse_options<'p>(
        &'p self,
        ctx: &mut ParsingContext<'p>,
        tokens: &[String],
        mut cursor: usize,
    ) -> usize {
        loop {
            let (next, step) = self.parse_next_option(ctx, tokens, cursor);
            cursor = next;
            if step == OptionStep::Done {
                return cursor;
            }
        }
    }

    /// Assigns positional tokens to argument descriptors, in order.
    ///
    /// Returns the cursor after the last consumed token.
    pub fn parse_arguments<'p>(
        &'p self,
        ctx: &mut ParsingContext<'p>,
        tokens: &[String],
        mut cursor: usize,
    ) -> usize {
        if ctx.halted() {
            return cursor;
        }

        for argument in &self.arguments {
            let remaining = tokens.len().saturating_sub(cursor);
            let wanted = argument.arity.wanted(remaining);
            let taken = wanted.min(remaining);
            let received = &tokens[cursor..cursor + taken];
            cursor += taken;

            if taken < wanted {
                ctx.record(ParseError::InadequateArguments {
                    name: argument.name.clone(),
                    target: argument.metavar.clone(),
                    expected: wanted,
                    received: received.to_vec(),
                });
                break;
            }

            let value = match argument.arity {
                Arity::Fixed(1) => Value::Str(received[0].clone()),
                _ => Value::strings(received.iter().cloned()),
            };
            ctx.arguments.insert(argument.name.as_str(), value);
        }

        cursor
    }

    /// Checks required options and marks the context finished.
    ///
    /// Returns `true` if any error was recorded during the whole parse.
    pub fn finish_parsing(&self, ctx: &mut ParsingContext<'_>) -> bool {
        if !ctx.halted() {
            for option in self.options.iter().filter(|o| o.required) {
                if option.is_satisfied_by(ctx.option(&option.name)) {
                    continue;
                }
                ctx.record(ParseError::MissingOption {
                    name: option.name.clone(),
                    option: option.display_alias().to_string(),
                });
                if ctx.finish_on_error {
                    break;
                }
            }
        }

        ctx.finished = true;
        !ctx.errors.is_empty()
    }

    /// Runs all phases in fail-fast mode.
    pub fn parse(&self, tokens: &[String]) -> Result<Parsed, ErrorChain> {
        self.parse_with(tokens, true)
    }

    /// Runs all phases; `finish_on_error = false` aggregates every error.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::{OptionSpec, ParseError, Parser};
    ///
    /// let parser = Parser::from_specs(
    ///     [OptionSpec::new("--a").required(), OptionSpec::new("--b").required()],
    ///     [],
    /// )?;
    ///
    /// let errors = parser.parse_with(&[], false).unwrap_err();
    /// assert_eq!(errors.len(), 2);
    ///
    /// let errors = parser.parse(&[]).unwrap_err();
    /// assert_eq!(errors.len(), 1);
    /// assert!(matches!(errors.first(), Some(ParseError::MissingOption { .. })));
    /// # Ok::<(), cmdtree_core::DescriptorError>(())
    /// ```
    pub fn parse_with(&self, tokens: &[String], finish_on_error: bool) -> Result<Parsed, ErrorChain> {
        let mut ctx = self.start_parsing();
        ctx.set_finish_on_error(finish_on_error);

        let cursor = self.parse_options(&mut ctx, tokens, 0);
        let cursor = self.parse_arguments(&mut ctx, tokens, cursor);
        if self.finish_parsing(&mut ctx) {
            return Err(ctx.into_errors());
        }

        Ok(Parsed {
            values: ctx.into_values(),
            rest: tokens[cursor..].to_vec(),
        })
    }
}
