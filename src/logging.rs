// src/logging.rs

//! Logging setup for `clusterlab` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CLUSTERLAB_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! The chosen level applies to `clusterlab` itself; every other target
//! (reqwest, hyper, the cookie store) is held at `warn` so a debug run of
//! `verify` is not buried in connection-pool chatter.
//!
//! Logs go to STDERR. STDOUT carries what a user would redirect or pipe: the
//! `plan` listing, the `provision --dry-run` description, the provisioning and
//! verification summaries, per-client `load` statistics, and the output of
//! commands run in `OutputMode::Forward` (package installs, `patch`, started
//! backends, steps with `forward_output`). Build commands run in
//! `OutputMode::Log`, so their output arrives here as `debug` lines on STDERR.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("CLUSTERLAB_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let filter = EnvFilter::try_new(filter_directives(level)).map_err(|e| anyhow::anyhow!(e))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

fn filter_directives(level: tracing::Level) -> String {
    format!("warn,clusterlab={}", level.as_str().to_ascii_lowercase())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
