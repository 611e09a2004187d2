//! Commands that resolve a positional token to a named subcommand.

use cmdtree_core::{ArgumentSpec, OptionSpec, ParsedValues};
use tracing::{debug, warn};

use crate::code::ReturnCode;
use crate::command::{Command, Frame};
use crate::dispatch::{Dispatch, DispatchState, Dispatcher, NodeConfig, report, report_halt};
use crate::error::{BuildError, DispatchError};
use crate::help;
use crate::sink::Sink;

type Hook<C> = Box<dyn FnMut(&mut Frame<'_, C>, &ParsedValues) -> Option<ReturnCode>>;

/// A command that owns a registry of subcommands.
///
/// In single mode exactly one subcommand runs and its leftover tokens become
/// the group's leftovers. In chain mode subcommands run one after another,
/// each one's leftovers naming the next, until no tokens remain; every child
/// ignores extra arguments so it can leave the rest of the chain behind.
pub struct CommandGroup<C = ()> {
    dispatcher: Dispatcher,
    commands: Vec<(String, Box<dyn Command<C>>)>,
    chain: bool,
    on_enter: Option<Hook<C>>,
}

impl<C> CommandGroup<C> {
    pub fn builder() -> GroupBuilder<C> {
        GroupBuilder::default()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_chain(&self) -> bool {
        self.chain
    }

    /// Adds a subcommand after construction.
    ///
    /// # Errors
    ///
    /// Fails on an empty name or a name that is already registered.
    pub fn register(&mut self, name: &str, command: Box<dyn Command<C>>) -> Result<(), BuildError> {
        if name.is_empty() {
            return Err(BuildError::EmptyCommandName);
        }
        if self.position(name).is_some() {
            return Err(BuildError::DuplicateCommand(name.to_string()));
        }
        self.commands.push((name.to_string(), command));
        Ok(())
    }

    /// Registered subcommand names in registration order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(name, _)| name.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&dyn Command<C>> {
        self.position(name).map(|index| self.commands[index].1.as_ref())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.commands.iter().position(|(candidate, _)| candidate == name)
    }

    fn fail(&mut self, frame: &mut Frame<'_, C>, error: DispatchError) -> ReturnCode {
        self.dispatcher.enter(DispatchState::ErrorHalted);
        report(&*self, frame, &error)
    }

    /// Reports a missing subcommand name, or shows help when the group was
    /// invoked with no tokens at all.
    fn no_command(&mut self, frame: &mut Frame<'_, C>, received_nothing: bool) -> ReturnCode {
        if received_nothing {
            self.help(&frame.program, &mut *frame.sink);
            return ReturnCode::Success;
        }
        self.fail(frame, DispatchError::MissingCommand)
    }

    fn finish(&mut self, frame: &mut Frame<'_, C>) -> ReturnCode {
        if let Err(error) = self
            .dispatcher
            .check_extra_arguments(frame.ignore_extra_arguments)
        {
            return self.fail(frame, error);
        }
        ReturnCode::Success
    }

    fn run_single(&mut self, frame: &mut Frame<'_, C>, received_nothing: bool) -> ReturnCode {
        let Some(name) = self.dispatcher.pop_extra_argument() else {
            return self.no_command(frame, received_nothing);
        };
        let Some(index) = self.position(&name) else {
            return self.fail(frame, DispatchError::NoSuchCommand(name));
        };
        debug!(program = %frame.program, command = %name, "Resolved subcommand");

        let ignore = frame.ignore_extra_arguments || self.dispatcher.ignores_extra_arguments();
        let tokens = self.dispatcher.take_extra_arguments();
        let child = &mut self.commands[index].1;
        let code = child.execute(&mut frame.child(&name, ignore), tokens);
        self.dispatcher
            .set_extra_arguments(child.take_extra_arguments());

        if !code.is_success() {
            return code;
        }
        self.finish(frame)
    }

    fn run_chain(&mut self, frame: &mut Frame<'_, C>, received_nothing: bool) -> ReturnCode {
        let Some(mut name) = self.dispatcher.pop_extra_argument() else {
            return self.no_command(frame, received_nothing);
        };

        loop {
            let Some(index) = self.position(&name) else {
                return self.fail(frame, DispatchError::NoSuchCommand(name));
            };
            debug!(program = %frame.program, command = %name, "Running chained subcommand");

            let tokens = self.dispatcher.take_extra_arguments();
            let child = &mut self.commands[index].1;
            let code = child.execute(&mut frame.child(&name, true), tokens);
            if !code.is_success() {
                warn!(program = %frame.program, command = %name, code = %code, "Chain aborted");
                return code;
            }
            self.dispatcher
                .set_extra_arguments(child.take_extra_arguments());

            match self.dispatcher.pop_extra_argument() {
                Some(next) => name = next,
                None => break,
            }
        }

        self.finish(frame)
    }
}

impl<C> Command<C> for CommandGroup<C> {
    fn execute(&mut self, frame: &mut Frame<'_, C>, tokens: Vec<String>) -> ReturnCode {
        let received_nothing = tokens.is_empty();
        let values = match self.dispatcher.parse_options(Some(tokens)) {
            Dispatch::Proceed(values) => values,
            halt => return report_halt(&*self, frame, halt),
        };

        if let Some(hook) = self.on_enter.as_mut() {
            if let Some(code) = hook(frame, &values) {
                debug!(program = %frame.program, code = %code, "Entry hook short-circuited dispatch");
                self.dispatcher.enter(DispatchState::Done);
                return code;
            }
        }

        self.dispatcher.enter(DispatchState::Executing);
        let code = if self.chain {
            self.run_chain(frame, received_nothing)
        } else {
            self.run_single(frame, received_nothing)
        };
        if self.dispatcher.state() == DispatchState::Executing {
            self.dispatcher.enter(DispatchState::Done);
        }
        code
    }

    fn description(&self) -> &str {
        self.dispatcher.description()
    }

    fn usage_pattern(&self) -> String {
        let commands = if self.chain {
            "COMMAND1 [ARGS]... [COMMAND2 [ARGS]...]..."
        } else {
            "COMMAND [ARGS]..."
        };
        let own = self.dispatcher.usage_pattern();
        if own.is_empty() {
            commands.to_string()
        } else {
            format!("{own} {commands}")
        }
    }

    fn help(&self, program: &str, sink: &mut dyn Sink) {
        let commands: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|(name, command)| (name.as_str(), command.description()))
            .collect();
        help::render_help(
            sink,
            program,
            &self.usage_pattern(),
            self.description(),
            self.dispatcher.parser(),
            &commands,
        );
    }

    fn take_extra_arguments(&mut self) -> Vec<String> {
        self.dispatcher.take_extra_arguments()
    }

    fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }
}

/// Builder for [`CommandGroup`].
pub struct GroupBuilder<C> {
    config: NodeConfig,
    commands: Vec<(String, Box<dyn Command<C>>)>,
    chain: bool,
    on_enter: Option<Hook<C>>,
}

impl<C> Default for GroupBuilder<C> {
    fn default() -> Self {
        Self {
            config: NodeConfig::default(),
            commands: Vec::new(),
            chain: false,
            on_enter: None,
        }
    }
}

impl<C> GroupBuilder<C> {
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

    pub fn help_aliases(mut self, aliases: &str) -> Self {
        self.config.help_aliases = Some(aliases.to_string());
        self
    }

    pub fn ignore_extra_arguments(mut self, ignore: bool) -> Self {
        self.config.ignore_extra_arguments = ignore;
        self
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs several subcommands per invocation.
    pub fn chain(mut self, chain: bool) -> Self {
        self.chain = chain;
        self
    }

    /// Called with the group's own values before any subcommand runs.
    /// Returning `Some(code)` ends the invocation with that code.
    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Frame<'_, C>, &ParsedValues) -> Option<ReturnCode> + 'static,
    {
        self.on_enter = Some(Box::new(hook));
        self
    }

    pub fn command(mut self, name: &str, command: impl Command<C> + 'static) -> Self {
        self.commands.push((name.to_string(), Box::new(command)));
        self
    }

    pub fn boxed_command(mut self, name: &str, command: Box<dyn Command<C>>) -> Self {
        self.commands.push((name.to_string(), command));
        self
    }

    /// # Errors
    ///
    /// Fails on invalid option/argument specs, empty subcommand names and
    /// duplicate subcommand names.
    pub fn build(self) -> Result<CommandGroup<C>, BuildError> {
        let mut group = CommandGroup {
            dispatcher: Dispatcher::new(self.config)?,
            commands: Vec::with_capacity(self.commands.len()),
            chain: self.chain,
            on_enter: self.on_enter,
        };
        for (name, command) in self.commands {
            group.register(&name, command)?;
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::LeafCommand;
    use crate::sink::BufferSink;

    type Log = Vec<(String, Vec<String>)>;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn target_leaf(name: &'static str) -> LeafCommand<Log> {
        LeafCommand::builder()
            .description("Record the target.")
            .argument(ArgumentSpec::new("target"))
            .action(move |frame: &mut Frame<'_, Log>, values: &ParsedValues| {
                let target = values.argument_str("target").unwrap_or_default().to_string();
                frame.context.push((name.to_string(), vec![target]));
            })
            .build()
            .unwrap()
    }

    fn group(chain: bool) -> CommandGroup<Log> {
        CommandGroup::builder()
            .description("Tools.")
            .chain(chain)
            .command("build", target_leaf("build"))
            .command("test", target_leaf("test"))
            .build()
            .unwrap()
    }

    fn execute(group: &mut CommandGroup<Log>, raw: &[&str]) -> (ReturnCode, Log, BufferSink) {
        let mut log = Log::new();
        let mut sink = BufferSink::default();
        let code = group.execute(&mut Frame::new("tool", &mut log, &mut sink), tokens(raw));
        (code, log, sink)
    }

    #[test]
    fn test_single_dispatch_runs_one_child() {
        let mut g = group(false);
        let (code, log, _) = execute(&mut g, &["build", "x"]);
        assert_eq!(code, ReturnCode::Success);
        assert_eq!(log, vec![("build".to_string(), tokens(&["x"]))]);
        assert_eq!(g.state(), DispatchState::Done);
    }

    #[test]
    fn test_single_dispatch_rejects_child_leftovers() {
        let mut g = group(false);
        let (code, log, sink) = execute(&mut g, &["build", "x", "test", "y"]);
        assert_eq!(code, ReturnCode::FAILURE);
        assert!(log.is_empty());
        assert_eq!(sink.errors[0], "Usage: tool build [OPTIONS] TARGET");
        assert_eq!(sink.errors[1], "Error: unexpected extra argument(s): test y");
    }

    #[test]
    fn test_unknown_command() {
        let mut g = group(false);
        let (code, _, sink) = execute(&mut g, &["deploy"]);
        assert_eq!(code, ReturnCode::FAILURE);
        assert_eq!(sink.errors[1], "Error: no such command: deploy");
        assert_eq!(g.state(), DispatchState::ErrorHalted);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut g = group(false);
        let (code, _, sink) = execute(&mut g, &["Build", "x"]);
        assert_eq!(code, ReturnCode::FAILURE);
        assert!(sink.contains("no such command: Build"));
    }

    #[test]
    fn test_no_tokens_shows_help() {
        let mut g = group(false);
        let (code, log, sink) = execute(&mut g, &[]);
        assert_eq!(code, ReturnCode::Success);
        assert!(log.is_empty());
        assert_eq!(sink.lines[0], "Usage: tool [OPTIONS] COMMAND [ARGS]...");
        assert!(sink.lines.contains(&"  build  Record the target.".to_string()));
    }

    #[test]
    fn test_options_without_command_is_missing_command() {
        let mut g = CommandGroup::<Log>::builder()
            .option(OptionSpec::new("-v, --verbose").flag())
            .command("build", target_leaf("build"))
            .build()
            .unwrap();
        let (code, _, sink) = execute(&mut g, &["-v"]);
        assert_eq!(code, ReturnCode::FAILURE);
        assert_eq!(sink.errors[1], "Error: missing command");
    }

    #[test]
    fn test_chain_runs_children_in_order() {
        let mut g = group(true);
        let (code, log, _) = execute(&mut g, &["build", "x", "test", "y"]);
        assert_eq!(code, ReturnCode::Success);
        assert_eq!(
            log,
            vec![
                ("build".to_string(), tokens(&["x"])),
                ("test".to_string(), tokens(&["y"])),
            ]
        );
    }

    #[test]
    fn test_chain_aborts_on_first_failure() {
        let failing: LeafCommand<Log> = LeafCommand::builder().action(|_, _| 3).build().unwrap();
        let mut g = CommandGroup::builder()
            .chain(true)
            .command("lint", failing)
            .command("build", target_leaf("build"))
            .build()
            .unwrap();
        let (code, log, _) = execute(&mut g, &["lint", "build", "x"]);
        assert_eq!(code, ReturnCode::Failure(3));
        assert!(log.is_empty());
    }

    #[test]
    fn test_chain_treats_zero_failure_code_as_success() {
        let quiet: LeafCommand<Log> = LeafCommand::builder()
            .action(|_, _| ReturnCode::Failure(0))
            .build()
            .unwrap();
        let mut g = CommandGroup::builder()
            .chain(true)
            .command("lint", quiet)
            .command("build", target_leaf("build"))
            .build()
            .unwrap();
        let (code, log, _) = execute(&mut g, &["lint", "build", "x"]);
        assert!(code.is_success());
        assert_eq!(log, vec![("build".to_string(), tokens(&["x"]))]);
    }

    #[test]
    fn test_chain_unknown_command_after_success() {
        let mut g = group(true);
        let (code, log, sink) = execute(&mut g, &["build", "x", "ship"]);
        assert_eq!(code, ReturnCode::FAILURE);
        assert_eq!(log.len(), 1);
        assert!(sink.contains("no such command: ship"));
    }

    #[test]
    fn test_hook_short_circuits() {
        let mut g = CommandGroup::<Log>::builder()
            .option(OptionSpec::new("--version").flag())
            .on_enter(|frame, values| {
                if values.flag("version") {
                    frame.sink.line("tool 1.0");
                    Some(ReturnCode::Success)
                } else {
                    None
                }
            })
            .command("build", target_leaf("build"))
            .build()
            .unwrap();

        let (code, log, sink) = execute(&mut g, &["--version"]);
        assert_eq!(code, ReturnCode::Success);
        assert!(log.is_empty());
        assert_eq!(sink.lines, vec!["tool 1.0"]);

        let (code, log, _) = execute(&mut g, &["build", "x"]);
        assert_eq!(code, ReturnCode::Success);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_duplicate_command_name_fails_build() {
        let result = CommandGroup::<Log>::builder()
            .command("build", target_leaf("build"))
            .command("build", target_leaf("build"))
            .build();
        assert!(matches!(result, Err(BuildError::DuplicateCommand(name)) if name == "build"));
    }

    #[test]
    fn test_empty_command_name_fails_register() {
        let mut g = group(false);
        let err = g.register("", Box::new(target_leaf("x"))).unwrap_err();
        assert!(matches!(err, BuildError::EmptyCommandName));
        assert_eq!(g.command_names().collect::<Vec<_>>(), vec!["build", "test"]);
    }

    #[test]
    fn test_chain_usage_pattern() {
        let g = group(true);
        assert_eq!(
            g.usage_pattern(),
            "[OPTIONS] COMMAND1 [ARGS]... [COMMAND2 [ARGS]...]..."
        );
        assert!(g.find("test").is_some());
        assert!(g.find("deploy").is_none());
    }
}
