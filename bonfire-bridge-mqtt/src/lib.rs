//! MQTT bridge for Bonfire tag-update events.
//!
//! The bridge subscribes to the Bonfire `tag/update` channel, reshapes each
//! event into a small JSON message and publishes it to a configured MQTT
//! topic. It is a pure relay: no buffering, no delivery tracking, no
//! outbound surface beyond the publishes themselves.
//!
//! - [`config`] - Configuration loading and validation (JSON format)
//! - [`event`] - Tag-update event model and the outbound projection
//! - [`relay`] - The dispatcher owning both connections
//! - [`liveness`] - Parent-process liveness monitoring

pub mod config;
pub mod event;
pub mod liveness;
pub mod relay;

pub use config::{BridgeConfig, ConfigError, LivenessConfig, LogFormat, LoggingConfig, Settings};
pub use event::{EventParseError, PublishedMessage, TagUpdateEvent, TagValue};
pub use liveness::ParentWatch;
pub use relay::{MqttRelay, TAG_UPDATE_CHANNEL};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// The `RUST_LOG` environment variable overrides the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
