// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The binary stands in for the request layer: it collects the raw
//! parameters, hands them to the pipeline once, and reports the outcome.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `scalepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scalepipe",
    version,
    about = "Detect meaningful scales (noise levels) along the contours of an image.",
    long_about = None
)]
pub struct CliArgs {
    /// Working directory holding `input_0.png`; all outputs land here.
    #[arg(long, value_name = "DIR")]
    pub work_dir: PathBuf,

    /// Binarization threshold (ignored with `--auto-threshold`).
    #[arg(long, value_name = "T", default_value = "128")]
    pub threshold: String,

    /// Minimum contour size kept by the extractor.
    #[arg(long = "min-size", value_name = "M", default_value = "15")]
    pub min_size: String,

    /// Let the extractor pick its own threshold.
    #[arg(long)]
    pub auto_threshold: bool,

    /// Per-step timeout in seconds; overrides `[run].timeout_secs`.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Archive key; defaults to the working directory name.
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Scalepipe.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip archival even if `[archive].enabled` is set.
    #[arg(long)]
    pub no_archive: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCALEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate config + parameters, print the tool table, run nothing.
    #[arg(long)]
    pub dry_run: bool,
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
