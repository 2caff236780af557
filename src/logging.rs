//! Logging setup
//!
//! Installs a global `tracing` subscriber:
//! - `RUST_LOG` wins when set, otherwise the configured level
//! - Console output in pretty, compact or JSON form
//! - Optional daily-rolling log files through a non-blocking writer

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global subscriber
///
/// Keep the returned guard alive for as long as file logging should flush;
/// it is `None` when no log directory is configured. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log level '{}'", config.level))?,
    };

    let console = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    let (file, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .context("global tracing subscriber already installed")?;

    tracing::info!(
        "[Logging] Initialized (format: {:?}, files: {})",
        config.format,
        config
            .directory
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "off".to_string())
    );

    Ok(guard)
}
