use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cmdtree_core::ParsedValues;
use cmdtree_dispatch::{Command as _, ReturnCode, StdioSink, run};
use cmdtree_manifest::{CommandManifest, Invocation, Recorder, build_command};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for records printed on stdout.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One compact JSON document per line.
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "cmdtree")]
#[command(about = "Run token arrays against declarative command-tree manifests")]
#[command(version)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Log dispatch decisions to stderr (overrides RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute tokens against a manifest and print one record per leaf run.
    Run(RunArgs),
    /// Load and build a manifest without executing anything.
    Check(CheckArgs),
    /// Print the help page of the root or of a subcommand.
    Help(HelpArgs),
    /// Parse tokens against a single command node and print the values.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Manifest file (YAML, or JSON with a .json extension).
    #[arg(long)]
    manifest: PathBuf,
    /// Output format for invocation records.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Tokens passed to the root command.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Manifest file (YAML, or JSON with a .json extension).
    #[arg(long)]
    manifest: PathBuf,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Manifest file (YAML, or JSON with a .json extension).
    #[arg(long)]
    manifest: PathBuf,
    /// Subcommand path below the root, e.g. `deploy push`.
    path: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Manifest file (YAML, or JSON with a .json extension).
    #[arg(long)]
    manifest: PathBuf,
    /// Collect every error instead of stopping at the first.
    #[arg(long)]
    aggregate: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Subcommand path below the root naming the node to parse against.
    path: Vec<String>,
    /// Tokens to parse.
    #[arg(last = true)]
    tokens: Vec<String>,
}

/// Outcome of `cmdtree parse`.
#[derive(Debug, Serialize)]
struct ParseReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<ParsedValues>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rest: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Run(args) => run_manifest(args),
        Command::Check(args) => run_check(args).map(|()| ReturnCode::Success),
        Command::Help(args) => run_help(args).map(|()| ReturnCode::Success),
        Command::Parse(args) => run_parse(args),
    };

    match result {
        Ok(code) if code.is_success() => {}
        Ok(code) => std::process::exit(code.exit_status()),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn load_manifest(path: &Path) -> Result<CommandManifest, String> {
    let manifest = CommandManifest::load(path)
        .map_err(|err| format!("Failed to load manifest '{}': {err}", path.display()))?;
    debug!(manifest = %path.display(), program = %manifest.name, "Loaded manifest");
    Ok(manifest)
}

fn run_manifest(args: RunArgs) -> Result<ReturnCode, String> {
    let manifest = load_manifest(&args.manifest)?;
    let mut tool = build_command(&manifest, &mut Recorder).map_err(|e| e.to_string())?;

    let mut invocations: Vec<Invocation> = Vec::new();
    let code = run(
        tool.as_mut(),
        &manifest.name,
        args.tokens,
        &mut invocations,
        &mut StdioSink,
    );

    match args.format {
        OutputFormat::Json => {
            for invocation in &invocations {
                let line = serde_json::to_string(invocation)
                    .map_err(|err| format!("Failed to serialize invocation: {err}"))?;
                println!("{line}");
            }
        }
        OutputFormat::Yaml if !invocations.is_empty() => {
            let raw = serde_yaml::to_string(&invocations)
                .map_err(|err| format!("Failed to serialize invocations: {err}"))?;
            print!("{raw}");
        }
        OutputFormat::Yaml => {}
    }

    debug!(code = %code, invocations = invocations.len(), "Run finished");
    Ok(code)
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    build_command(&manifest, &mut Recorder).map_err(|e| e.to_string())?;
    println!(
        "Manifest '{}' OK: {} leaf command(s).",
        manifest.name,
        manifest.leaf_paths().len()
    );
    Ok(())
}

fn run_help(args: HelpArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    manifest.validate().map_err(|e| e.to_string())?;

    let mut node = manifest
        .resolve(args.path.as_slice())
        .map_err(|e| e.to_string())?
        .clone();
    node.name = program_path(&manifest, &args.path);
    let command = build_command(&node, &mut Recorder).map_err(|e| e.to_string())?;
    command.help(&node.name, &mut StdioSink);
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<ReturnCode, String> {
    let manifest = load_manifest(&args.manifest)?;
    let mut node = manifest
        .resolve(args.path.as_slice())
        .map_err(|e| e.to_string())?
        .clone();
    node.name = program_path(&manifest, &args.path);
    let parser = node.parser().map_err(|e| e.to_string())?;

    let (report, code) = match parser.parse_with(&args.tokens, !args.aggregate) {
        Ok(parsed) => (
            ParseReport {
                values: Some(parsed.values),
                rest: parsed.rest,
                errors: Vec::new(),
            },
            ReturnCode::Success,
        ),
        Err(errors) => (
            ParseReport {
                values: None,
                rest: Vec::new(),
                errors: errors.iter().map(ToString::to_string).collect(),
            },
            ReturnCode::FAILURE,
        ),
    };

    let raw = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to serialize parse report: {err}"))?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|err| format!("Failed to serialize parse report: {err}"))?,
    };
    println!("{}", raw.trim_end());
    Ok(code)
}

fn program_path(manifest: &CommandManifest, path: &[String]) -> String {
    std::iter::once(manifest.name.as_str())
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
