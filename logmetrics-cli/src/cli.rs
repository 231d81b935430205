//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logmetrics -- compile and validate log-metrics pipeline configuration.
///
/// Use `logmetrics <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logmetrics", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logmetrics YAML configuration file.
    #[arg(short, long, default_value = "logmetrics.yml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log line format.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Supported log line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Machine-parseable JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile the configuration and report the first error, if any.
    Check,

    /// Show the compiled configuration (defaults applied, regexes flattened).
    Show(ShowArgs),
}

// ---- show ----

/// Show the compiled configuration.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Show only one log group.
    #[arg(long)]
    pub group: Option<String>,
}
