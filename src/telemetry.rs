use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Initialize logging
///
/// Without telemetry, warnings go to stderr so the engine's own output stays
/// readable. With telemetry, everything from `info` up is appended to
/// `log_path`. `RUST_LOG` overrides the level either way. A subscriber that
/// is already installed is kept.
///
/// # Errors
/// Returns error if the log file or its directory cannot be created
pub fn init(enabled: bool, log_path: &str) -> Result<()> {
    if !enabled {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter("warn"))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .ok();
        return Ok(());
    }

    let expanded_path = Config::expand_path(log_path)?;

    // Create parent directory if needed
    if let Some(parent) = expanded_path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&expanded_path)
        .context("failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(file)
        .with_target(false)
        .with_ansi(false)
        .try_init()
        .ok();

    tracing::info!("telemetry initialized: {}", expanded_path.display());

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
