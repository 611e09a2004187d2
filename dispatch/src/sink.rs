//! Line sinks for help, usage and error text.
//!
//! Commands never write to stdout/stderr directly; they hand discrete lines
//! to a [`Sink`]. Any `FnMut(&str)` closure is a sink, [`StdioSink`] writes
//! to the terminal and [`BufferSink`] keeps everything in memory.

/// Receiver of output lines.
pub trait Sink {
    /// Regular output (help text).
    fn line(&mut self, line: &str);

    /// Diagnostic output (usage + error). Defaults to [`line`](Self::line).
    fn error(&mut self, line: &str) {
        self.line(line);
    }
}

impl<F: FnMut(&str)> Sink for F {
    fn line(&mut self, line: &str) {
        self(line)
    }
}

/// Writes help to stdout and diagnostics to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioSink;

impl Sink for StdioSink {
    fn line(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// Collects lines in memory, keeping output and diagnostics apart.
///
/// # Examples
///
/// ```
/// use cmdtree_dispatch::{BufferSink, Sink};
///
/// let mut sink = BufferSink::default();
/// sink.line("hello");
/// sink.error("oops");
/// assert_eq!(sink.lines, vec!["hello"]);
/// assert_eq!(sink.errors, vec!["oops"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSink {
    pub lines: Vec<String>,
    pub errors: Vec<String>,
}

impl BufferSink {
    /// Returns `true` if any output or diagnostic line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .iter()
            .chain(self.errors.iter())
            .any(|line| line.contains(needle))
    }
}

impl Sink for BufferSink {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.errors.push(line.to_string());
    }
}
