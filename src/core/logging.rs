use std::sync::OnceLock;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::core::config::settings::LoggingSettings;

const LOG_FILE: &str = "server.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot create log directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open rolling log file: {0}")]
    Appender(#[from] InitError),
    #[error("global subscriber already installed: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Daily rolling `server.log` in the configured directory plus stdout.
/// `RUST_LOG` wins over the configured level.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let file_appender = rolling_appender(settings)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

fn rolling_appender(settings: &LoggingSettings) -> Result<RollingFileAppender, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::Directory {
        path: settings.dir.display().to_string(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE)
        .build(&settings.dir)?;
    Ok(appender)
}
