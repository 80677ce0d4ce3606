//! File logging. The terminal belongs to the UI, so log lines go to
//! `<config>/cedit/cedit.log` through a non-blocking writer.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

const LOG_FILE: &str = "cedit.log";

/// Build the filter: `RUST_LOG` wins, then `fallback`, then `info`.
pub(crate) fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing into `dir`.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub(crate) fn init(dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;
    Ok(guard)
}
