//! Per-node dispatch engine.
//!
//! A [`Dispatcher`] owns one [`Parser`] (the node's descriptors plus the
//! builtin help flag) and the node's extra-argument buffer. It runs the
//! option and argument phases, intercepts `--help`, and reports the outcome
//! as a [`Dispatch`] value; leaves and groups decide what to do next.
//!
//! State flow of one execution:
//!
//! ```text
//! Init -> ParsingOptions -> ParsingArguments -> Validated -> Executing -> Done
//!                       \-> HelpRequested     \-> ErrorHalted
//! ```

use cmdtree_core::{ArgumentSpec, OptionSpec, ParsedValues, Parser, Value};
use tracing::{debug, trace};

use crate::code::ReturnCode;
use crate::command::{Command, Frame};
use crate::error::{BuildError, DispatchError};
use crate::help;

/// Value-map key of the builtin help flag.
pub const HELP_OPTION: &str = "help";

/// Aliases of the builtin help flag unless configured otherwise.
pub const DEFAULT_HELP_ALIASES: &str = "--help";

/// Where a node's last execution got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Init,
    ParsingOptions,
    ParsingArguments,
    HelpRequested,
    ErrorHalted,
    Validated,
    Executing,
    Done,
}

/// Outcome of [`Dispatcher::parse_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Parsing succeeded; the caller proceeds with these values.
    Proceed(ParsedValues),
    /// The help flag was given; print help and succeed.
    HelpRequested,
    /// Parsing failed; print usage plus the error and fail.
    Failed(DispatchError),
}

/// Declarative pieces shared by leaves and groups.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub description: String,
    pub options: Vec<OptionSpec>,
    pub arguments: Vec<ArgumentSpec>,
    /// Alias string of the builtin help flag; `None` uses `--help`.
    pub help_aliases: Option<String>,
    pub ignore_extra_arguments: bool,
}

/// Parsing and extra-argument bookkeeping for one command node.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    parser: Parser,
    description: String,
    extra_arguments: Vec<String>,
    ignore_extra_arguments: bool,
    state: DispatchState,
}

impl Dispatcher {
    /// Normalizes the node's specs and injects the builtin help flag.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Descriptor`] for any invalid spec, including
    /// user options that collide with the help flag.
    pub fn new(config: NodeConfig) -> Result<Self, BuildError> {
        let help_aliases = config
            .help_aliases
            .as_deref()
            .unwrap_or(DEFAULT_HELP_ALIASES);
        let help = OptionSpec::new(help_aliases)
            .name(HELP_OPTION)
            .flag()
            .help("Show this message and exit.");

        let options = config.options.into_iter().chain(std::iter::once(help));
        let parser = Parser::from_specs(options, config.arguments)?;

        Ok(Self {
            parser,
            description: config.description,
            extra_arguments: Vec::new(),
            ignore_extra_arguments: config.ignore_extra_arguments,
            state: DispatchState::Init,
        })
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn enter(&mut self, state: DispatchState) {
        trace!(from = ?self.state, to = ?state, "Dispatch state change");
        self.state = state;
    }

    pub fn ignores_extra_arguments(&self) -> bool {
        self.ignore_extra_arguments
    }

    pub fn extra_arguments(&self) -> &[String] {
        &self.extra_arguments
    }

    pub fn set_extra_arguments(&mut self, tokens: Vec<String>) {
        self.extra_arguments = tokens;
    }

    pub fn take_extra_arguments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.extra_arguments)
    }

    /// Removes and returns the first leftover token.
    pub fn pop_extra_argument(&mut self) -> Option<String> {
        if self.extra_arguments.is_empty() {
            None
        } else {
            Some(self.extra_arguments.remove(0))
        }
    }

    /// `[OPTIONS] ARGS...` for this node's own descriptors.
    pub fn usage_pattern(&self) -> String {
        help::parser_pattern(&self.parser)
    }

    /// Runs the option and argument phases.
    ///
    /// `tokens` of `None` parses the current extra-argument buffer. Tokens
    /// left unconsumed become the new buffer, also when help was requested.
    pub fn parse_options(&mut self, tokens: Option<Vec<String>>) -> Dispatch {
        let tokens = tokens.unwrap_or_else(|| std::mem::take(&mut self.extra_arguments));
        let parser = &self.parser;

        self.state = DispatchState::ParsingOptions;
        let mut ctx = parser.start_parsing();
        let cursor = parser.parse_options(&mut ctx, &tokens, 0);

        if ctx.option(HELP_OPTION) == Some(&Value::Bool(true)) {
            self.state = DispatchState::HelpRequested;
            self.extra_arguments = tokens[cursor..].to_vec();
            return Dispatch::HelpRequested;
        }

        self.state = DispatchState::ParsingArguments;
        let cursor = parser.parse_arguments(&mut ctx, &tokens, cursor);
        parser.finish_parsing(&mut ctx);
        self.extra_arguments = tokens[cursor..].to_vec();

        if let Some(first) = ctx.errors().first() {
            self.state = DispatchState::ErrorHalted;
            return Dispatch::Failed(DispatchError::Parse(first.clone()));
        }

        self.state = DispatchState::Validated;
        let mut values = ctx.into_values();
        values.options.remove(HELP_OPTION);
        debug!(
            options = values.options.len(),
            arguments = values.arguments.len(),
            extra = self.extra_arguments.len(),
            "Parsed command input"
        );
        Dispatch::Proceed(values)
    }

    /// Fails on leftover tokens unless this node or its parent ignores them.
    pub fn check_extra_arguments(&self, inherited_ignore: bool) -> Result<(), DispatchError> {
        if self.ignore_extra_arguments || inherited_ignore || self.extra_arguments.is_empty() {
            return Ok(());
        }
        Err(DispatchError::UnexpectedExtraArguments(
            self.extra_arguments.clone(),
        ))
    }
}

/// Prints usage plus `error` and returns [`ReturnCode::FAILURE`].
pub fn report<C, T>(command: &T, frame: &mut Frame<'_, C>, error: &DispatchError) -> ReturnCode
where
    T: Command<C> + ?Sized,
{
    debug!(program = %frame.program, error = %error, "Command failed");
    frame
        .sink
        .error(&help::usage_line(&frame.program, &command.usage_pattern()));
    frame.sink.error(&format!("Error: {error}"));
    ReturnCode::FAILURE
}

/// Turns a non-proceeding [`Dispatch`] into the node's return code.
pub fn report_halt<C, T>(command: &T, frame: &mut Frame<'_, C>, halt: Dispatch) -> ReturnCode
where
    T: Command<C> + ?Sized,
{
    match halt {
        Dispatch::HelpRequested => {
            command.help(&frame.program, &mut *frame.sink);
            ReturnCode::Success
        }
        Dispatch::Failed(error) => report(command, frame, &error),
        Dispatch::Proceed(_) => ReturnCode::Success,
    }
}
