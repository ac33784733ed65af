// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::engine::OutputFormat;

/// Command-line arguments for `freshen`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "freshen",
    version,
    about = "Decide which build outputs are stale and re-plan on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, global = true, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FRESHEN_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Classify every pipeline (or one) and print what needs building.
    Plan(PlanArgs),

    /// Check whether one template page is stale.
    Stale(StaleArgs),

    /// Watch for changes and re-plan affected pipelines until Ctrl-C.
    Watch(OutputArgs),

    /// Parse + validate the config and print it; touch no other files.
    Check,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also list sources that are up to date.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Only plan this pipeline.
    #[arg(long, value_name = "NAME")]
    pub pipeline: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
#[command(group(clap::ArgGroup::new("reference").required(true).args(["since", "against"])))]
pub struct StaleArgs {
    /// Template page to check.
    pub template: PathBuf,

    /// Reference timestamp in epoch milliseconds.
    #[arg(long, value_name = "MS")]
    pub since: Option<u64>,

    /// Use this rendered output's mtime as the reference.
    #[arg(long, value_name = "PATH")]
    pub against: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
