//! Logging setup
//!
//! Diagnostics go to stderr; stdout carries the lifecycle status lines.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when neither a level nor `RUST_LOG` is given
pub const DEFAULT_FILTER: &str = "warn,forkgroup=info";

/// Initialise the global subscriber
///
/// # Arguments
/// * `log_level` - filter directive (trace, debug, info, warn, error, or `target=level`); falls back to `RUST_LOG`
/// * `log_file` - also append plain-text logs to this file
///
/// # Examples
/// ```no_run
/// use forkgroup::utils::logger::init_logger;
///
/// init_logger(Some("debug"), None).unwrap();
/// ```
pub fn init_logger(log_level: Option<&str>, log_file: Option<PathBuf>) -> Result<()> {
    let env_filter = build_filter(log_level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(console::Term::stderr().is_term())
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(std::sync::Arc::new(file))
            .with_target(true)
            .with_ansi(false)
            .with_level(true);

        registry.with(file_layer).try_init()?;
    } else {
        registry.try_init()?;
    }

    tracing::debug!("Logger initialized");
    Ok(())
}

fn build_filter(log_level: Option<&str>) -> Result<EnvFilter> {
    Ok(match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    })
}
