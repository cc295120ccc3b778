//! CLI argument definitions for the pipeline runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "polars-pipe",
    version,
    about = "Validate, stamp and transform tabular data in bounded chunks",
    long_about = "Run a configured pipeline over a CSV, Parquet or NDJSON source.\n\n\
                  Rows failing validation are written to error records with their\n\
                  reasons; valid rows receive lineage columns and the configured\n\
                  transformations, with descriptive statistics before and after."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a pipeline configuration.
    Run(RunArgs),

    /// List the registered derive functions.
    Functions,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Pipeline configuration file (.json or .toml).
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Run identifier used for the output directory and lineage columns
    /// (default: a random UUID).
    #[arg(long = "guid", value_name = "ID")]
    pub guid: Option<String>,

    /// Compose the pipeline and print the optimized plan and chunk plan
    /// without writing anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
