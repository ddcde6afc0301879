// src/logging.rs

//! Logging setup for `scalepipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter is picked in this order:
//! 1. `--log-level` on the command line;
//! 2. `SCALEPIPE_LOG`, either a bare level ("debug") or full directives
//!    ("scalepipe::exec=debug,info");
//! 3. `info`.
//!
//! Everything goes to STDERR. Stdout carries only the path of the rendered
//! figure (or the dry-run table).

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "SCALEPIPE_LOG";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising tracing subscriber: {e}"))?;

    Ok(())
}

/// Resolve the effective filter from the CLI flag and the env value.
///
/// Unparseable env directives fall back to `info` rather than failing startup.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(level_name(lvl));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => match parse_level_str(spec) {
            Some(level) => EnvFilter::new(level.as_str().to_lowercase()),
            None => EnvFilter::try_new(spec).unwrap_or_else(|_| EnvFilter::new("info")),
        },
        None => EnvFilter::new("info"),
    }
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// A bare level name, case-insensitive. `warning` is accepted for `warn`.
pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
