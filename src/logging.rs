//! Tracing subscriber setup.
//!
//! Logs go to stderr, and additionally to a daily-rolling file when
//! `logging.directory` is configured. `RUST_LOG` overrides the configured
//! filter.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::{GeotagError, Result};

/// File name prefix for rolled log files (`geotagger.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "geotagger.log";

/// Keeps the file writer alive. Dropping it flushes pending lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// The filter in effect: `RUST_LOG` when set and valid, else `configured`.
pub fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    subscriber
        .try_init()
        .map_err(|e| GeotagError::Config(format!("failed to install tracing subscriber: {e}")))?;
    Ok(guard)
}

/// Subscriber with the stderr layer and, when configured, the file layer.
fn build_subscriber(
    config: &LoggingConfig,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, LoggingGuard)> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true);

    let (file_layer, file_guard) = match &config.directory {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(&config.filter))
        .with(stderr_layer)
        .with(file_layer);
    let guard = LoggingGuard {
        _file_guard: file_guard,
    };
    Ok((subscriber, guard))
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
