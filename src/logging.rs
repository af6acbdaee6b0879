use config::ConfigError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::LoggingConfig;
use crate::utils::error::{AppError, Result};

/// Install console and file logging.
///
/// `RUST_LOG` wins over the configured default filter. Keep the returned
/// guard alive for as long as the file should receive events.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| filter_from(&config.default_filter))?;

    std::fs::create_dir_all(&config.directory)?;
    let file_appender = rolling::never(&config.directory, &config.file_name);
    let (file_writer, guard) = non_blocking(file_appender);

    let file_layer = fmt::Layer::new()
        .with_writer(file_writer)
        .with_target(false)
        .with_ansi(false);
    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_target(false);

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?;

    Ok(guard)
}

fn filter_from(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        AppError::Config(ConfigError::Message(format!(
            "Invalid log filter '{}': {}",
            directives, e
        )))
    })
}
