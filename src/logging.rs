//! File logging.
//!
//! The TUI owns the terminal, so log output goes to a file under the platform
//! data directory. Level is taken from `TEAM_REGISTER_LOG` (default `info`).

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "TEAM_REGISTER_LOG";

pub fn log_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("no data directory available for logs")?;
    Ok(base.join("team-register").join("logs"))
}

/// Install the global subscriber. Keep the guard alive until exit to flush.
pub fn init() -> Result<WorkerGuard> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&dir, "team-register.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::Layer::default()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(guard)
}
