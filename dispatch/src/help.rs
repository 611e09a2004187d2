//! Usage and help text.
//!
//! Layout:
//!
//! ```text
//! Usage: tool [OPTIONS] COMMAND [ARGS]...
//!
//!   Description.
//!
//! Options:
//!   -n, --name <VALUE>  Who to greet.
//!   --help              Show this message and exit.
//!
//! Commands:
//!   build  Build things.
//! ```

use cmdtree_core::Parser;

use crate::sink::Sink;

const INDENT: &str = "  ";
const COLUMN_GAP: usize = 2;

/// `Usage: <program> <pattern>`.
pub fn usage_line(program: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        format!("Usage: {program}")
    } else {
        format!("Usage: {program} {pattern}")
    }
}

/// `[OPTIONS] ARG [REST...]` for a parser's descriptors.
pub fn parser_pattern(parser: &Parser) -> String {
    let mut parts = Vec::new();
    if !parser.options().is_empty() {
        parts.push("[OPTIONS]".to_string());
    }
    parts.extend(parser.arguments().iter().map(|a| a.metavar.clone()));
    parts.join(" ")
}

/// Full help page for one command node.
///
/// `commands` lists `(name, description)` pairs for groups; leaves pass an
/// empty slice.
pub fn render_help(
    sink: &mut dyn Sink,
    program: &str,
    pattern: &str,
    description: &str,
    parser: &Parser,
    commands: &[(&str, &str)],
) {
    sink.line(&usage_line(program, pattern));

    if !description.is_empty() {
        sink.line("");
        for line in description.lines() {
            sink.line(&format!("{INDENT}{line}").trim_end());
        }
    }

    let options: Vec<(String, &str)> = parser
        .options()
        .iter()
        .map(|o| (o.usage_fragment(), o.help.as_deref().unwrap_or("")))
        .collect();
    render_section(sink, "Options:", &options);

    let arguments: Vec<(String, &str)> = parser
        .arguments()
        .iter()
        .filter(|a| a.help.is_some())
        .map(|a| (a.metavar.clone(), a.help.as_deref().unwrap_or("")))
        .collect();
    render_section(sink, "Arguments:", &arguments);

    let commands: Vec<(String, &str)> = commands
        .iter()
        .map(|(name, desc)| (name.to_string(), first_line(desc)))
        .collect();
    render_section(sink, "Commands:", &commands);
}

fn render_section(sink: &mut dyn Sink, title: &str, rows: &[(String, &str)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(term, _)| term.len()).max().unwrap_or(0);

    sink.line("");
    sink.line(title);
    for (term, text) in rows {
        if text.is_empty() {
            sink.line(&format!("{INDENT}{term}"));
        } else {
            let pad = width - term.len() + COLUMN_GAP;
            sink.line(&format!("{INDENT}{term}{:pad$}{text}", ""));
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
