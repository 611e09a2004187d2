//! The capability interface shared by every command node.

use tracing::debug;

use crate::code::ReturnCode;
use crate::dispatch::DispatchState;
use crate::sink::Sink;

/// Per-execution environment handed down the command tree.
///
/// `program` is the command path used in usage text (`tool build`),
/// `context` is the caller's opaque value shared by every node, and
/// `ignore_extra_arguments` is the flag inherited from the parent.
pub struct Frame<'a, C> {
    pub program: String,
    pub context: &'a mut C,
    pub sink: &'a mut dyn Sink,
    pub ignore_extra_arguments: bool,
}

impl<'a, C> Frame<'a, C> {
    pub fn new(program: &str, context: &'a mut C, sink: &'a mut dyn Sink) -> Self {
        Self {
            program: program.to_string(),
            context,
            sink,
            ignore_extra_arguments: false,
        }
    }

    /// Frame for the subcommand `name`, reborrowing context and sink.
    pub fn child(&mut self, name: &str, ignore_extra_arguments: bool) -> Frame<'_, C> {
        Frame {
            program: format!("{} {name}", self.program),
            context: &mut *self.context,
            sink: &mut *self.sink,
            ignore_extra_arguments,
        }
    }
}

/// A node of the command tree.
///
/// Implemented by [`LeafCommand`](crate::LeafCommand) and
/// [`CommandGroup`](crate::CommandGroup); groups hold other commands as
/// `Box<dyn Command<C>>`.
pub trait Command<C = ()> {
    /// Parses `tokens` and runs the command, returning its code.
    fn execute(&mut self, frame: &mut Frame<'_, C>, tokens: Vec<String>) -> ReturnCode;

    /// One-paragraph description shown in help and command listings.
    fn description(&self) -> &str;

    /// Usage pattern after the program name, e.g. `[OPTIONS] FILE`.
    fn usage_pattern(&self) -> String;

    /// Writes the full help page.
    fn help(&self, program: &str, sink: &mut dyn Sink);

    /// Hands over the tokens this node left unconsumed in its last run.
    fn take_extra_arguments(&mut self) -> Vec<String>;

    /// Where the last execution stopped.
    fn state(&self) -> DispatchState;
}

/// Executes a root command.
///
/// # Examples
///
/// ```
/// use cmdtree_dispatch::{BufferSink, LeafCommand, ReturnCode, run};
///
/// let mut greet = LeafCommand::<Vec<String>>::builder()
///     .description("Say hello.")
///     .option(cmdtree_core::OptionSpec::new("-n, --name").required())
///     .action(|frame, values| {
///         let name = values.option_str("name").unwrap_or_default().to_string();
///         frame.context.push(name);
///     })
///     .build()?;
///
/// let mut seen = Vec::new();
/// let mut sink = BufferSink::default();
/// let code = run(&mut greet, "greet", vec!["--name".into(), "ann".into()], &mut seen, &mut sink);
///
/// assert_eq!(code, ReturnCode::Success);
/// assert_eq!(seen, vec!["ann"]);
/// # Ok::<(), cmdtree_dispatch::BuildError>(())
/// ```
pub fn run<C, T>(
    command: &mut T,
    program: &str,
    tokens: Vec<String>,
    context: &mut C,
    sink: &mut dyn Sink,
) -> ReturnCode
where
    T: Command<C> + ?Sized,
{
    debug!(program, tokens = ?tokens, "Executing command tree");
    let mut frame = Frame::new(program, context, sink);
    let code = command.execute(&mut frame, tokens);
    debug!(program, code = %code, "Command tree finished");
    code
}
