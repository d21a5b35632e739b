//! resembed CLI: generates embedded resource targets outside of build scripts.
//!
//! Provides `resembed generate` to (re)generate targets from `resembed.toml`,
//! `resembed clean` to purge generated units and records, and `resembed list`
//! to show what a target currently embeds.

#![warn(missing_docs)]

mod clean;
mod generate;
mod list;
mod logging;
mod project;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// resembed: compile-time checked resource embedding.
#[derive(Parser, Debug)]
#[command(name = "resembed", version, about = "Resource embedding generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `resembed.toml` configuration file or its directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate blob units and manifests for targets.
    Generate(GenerateArgs),
    /// Remove generated units, manifests and records.
    Clean(CleanArgs),
    /// Show the resources a target currently embeds.
    List(ListArgs),
}

/// Arguments for the `resembed generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Targets to generate. All configured targets if omitted.
    pub targets: Vec<String>,

    /// Replace the configured roots (requires exactly one target).
    #[arg(long)]
    pub root: Vec<PathBuf>,

    /// Override the base output directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Regenerate every resource, ignoring the incremental record.
    #[arg(short, long)]
    pub force: bool,

    /// Number of worker threads.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Purge generated output before generating.
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for the `resembed clean` subcommand.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Targets to clean. All configured targets if omitted.
    pub targets: Vec<String>,

    /// Override the base output directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Arguments for the `resembed list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Target to list.
    pub target: String,

    /// Override the base output directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Listing output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table.
    Text,
    /// The generation record as JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    logging::init_logging(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
        Command::List(ref args) => list::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
