//! Terminal commands that hand parsed values to a callback.

use cmdtree_core::{ArgumentSpec, OptionSpec, ParsedValues};
use tracing::debug;

use crate::code::ReturnCode;
use crate::command::{Command, Frame};
use crate::dispatch::{Dispatch, DispatchState, Dispatcher, NodeConfig, report, report_halt};
use crate::error::BuildError;
use crate::help;
use crate::sink::Sink;

type Action<C> = Box<dyn FnMut(&mut Frame<'_, C>, &ParsedValues) -> ReturnCode>;

/// A command without subcommands.
///
/// Execution order: parse (help short-circuits here), reject leftover
/// tokens unless extras are ignored, then call the action and return its
/// code as-is.
pub struct LeafCommand<C = ()> {
    dispatcher: Dispatcher,
    action: Action<C>,
}

impl<C> LeafCommand<C> {
    pub fn builder() -> LeafBuilder<C> {
        LeafBuilder::default()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl<C> Command<C> for LeafCommand<C> {
    fn execute(&mut self, frame: &mut Frame<'_, C>, tokens: Vec<String>) -> ReturnCode {
        let values = match self.dispatcher.parse_options(Some(tokens)) {
            Dispatch::Proceed(values) => values,
            halt => return report_halt(&*self, frame, halt),
        };

        if let Err(error) = self
            .dispatcher
            .check_extra_arguments(frame.ignore_extra_arguments)
        {
            self.dispatcher.enter(DispatchState::ErrorHalted);
            return report(&*self, frame, &error);
        }

        self.dispatcher.enter(DispatchState::Executing);
        debug!(program = %frame.program, "Running command action");
        let code = (self.action)(frame, &values);
        self.dispatcher.enter(DispatchState::Done);
        code
    }

    fn description(&self) -> &str {
        self.dispatcher.description()
    }

    fn usage_pattern(&self) -> String {
        self.dispatcher.usage_pattern()
    }

    fn help(&self, program: &str, sink: &mut dyn Sink) {
        help::render_help(
            sink,
            program,
            &self.usage_pattern(),
            self.description(),
            self.dispatcher.parser(),
            &[],
        );
    }

    fn take_extra_arguments(&mut self) -> Vec<String> {
        self.dispatcher.take_extra_arguments()
    }

    fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }
}

/// Builder for [`LeafCommand`].
pub struct LeafBuilder<C> {
    config: NodeConfig,
    action: Option<Action<C>>,
}

impl<C> Default for LeafBuilder<C> {
    fn default() -> Self {
        Self {
            config: NodeConfig::default(),
            action: None,
        }
    }
}

impl<C> LeafBuilder<C> {
    pub fn description(mut self, description: &str) -> Self {
        self.config.description = description.to_string();
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.config.options.push(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.config.arguments.push(argument);
        self
    }

    /// Replaces the builtin help aliases (`--help`).
    pub fn help_aliases(mut self, aliases: &str) -> Self {
        self.config.help_aliases = Some(aliases.to_string());
        self
    }

    pub fn ignore_extra_arguments(mut self, ignore: bool) -> Self {
        self.config.ignore_extra_arguments = ignore;
        self
    }

    /// Uses a prepared [`NodeConfig`] instead of the individual setters.
    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback; its return value becomes the command's code.
    pub fn action<F, R>(mut self, mut action: F) -> Self
    where
        F: FnMut(&mut Frame<'_, C>, &ParsedValues) -> R + 'static,
        R: Into<ReturnCode>,
    {
        self.action = Some(Box::new(
            move |frame: &mut Frame<'_, C>, values: &ParsedValues| -> ReturnCode {
                action(frame, values).into()
            },
        ));
        self
    }

    /// Builds the command. Without an action the command just succeeds.
    pub fn build(self) -> Result<LeafCommand<C>, BuildError> {
        Ok(LeafCommand {
            dispatcher: Dispatcher::new(self.config)?,
            action: self.action.unwrap_or_else(|| {
                Box::new(|_: &mut Frame<'_, C>, _: &ParsedValues| ReturnCode::Success)
            }),
        })
    }
}
