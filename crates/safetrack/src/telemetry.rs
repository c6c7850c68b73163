//! Process-wide logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::SafetrackError;

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG` wins over the configured level. Calling this a second time
/// returns an error instead of replacing the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SafetrackError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| SafetrackError::Telemetry(format!("invalid log level: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        ),
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().with_target(false)),
        ),
    };
    installed.map_err(|e| SafetrackError::Telemetry(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| SafetrackError::Telemetry(e.to_string()))?;
    Ok(())
}
