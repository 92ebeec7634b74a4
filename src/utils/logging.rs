// src/utils/logging.rs
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::utils::{
    config::LoggingConfig,
    error::{AuthError, Result},
};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
/// When a log directory is configured the returned guard must be kept alive
/// for the lifetime of the process, otherwise buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AuthError::Config(format!("Invalid log level {:?}: {}", config.level, e)))?;

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "gesturekey.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .try_init()
                .map_err(|e| AuthError::Config(format!("Failed to install subscriber: {}", e)))?;

            Ok(Some(guard))
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .try_init()
                .map_err(|e| AuthError::Config(format!("Failed to install subscriber: {}", e)))?;

            Ok(None)
        }
    }
}

