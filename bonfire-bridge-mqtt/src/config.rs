//! Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating the configuration.
///
/// All of these are fatal: the bridge refuses to start on a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON.
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: json5::Error,
    },

    /// A field value is out of range or otherwise unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// MQTT broker and publishing settings.
    pub settings: Settings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Parent-process liveness check.
    #[serde(default)]
    pub liveness: LivenessConfig,
}

/// MQTT broker and publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Broker host, with an optional port ("localhost" or "broker:8883").
    pub host: String,

    /// Topic every tag update is published to.
    pub topic: String,

    /// MQTT QoS level: 0, 1, or 2.
    pub qos: u8,

    /// Whether published messages carry the retain flag.
    pub retain: bool,

    /// MQTT client identifier.
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_client_id() -> String {
    format!("bonfire-bridge-mqtt-{}", std::process::id())
}

impl Settings {
    /// Split `host` into hostname and port, defaulting to the standard
    /// MQTT port when none is given.
    pub fn host_port(&self) -> Result<(String, u16), ConfigError> {
        match self.host.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| {
                    ConfigError::invalid(format!("bad port in settings.host '{}'", self.host))
                })?;
                Ok((host.to_string(), port))
            }
            None => Ok((self.host.clone(), 1883)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Parent-process liveness check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Interval between parent checks, in milliseconds.
    #[serde(default = "default_liveness_interval_ms")]
    pub interval_ms: u64,

    /// Exit status used when the parent goes away. Must be non-zero so
    /// supervisors can tell the abort from a clean shutdown.
    #[serde(default = "default_liveness_exit_code")]
    pub exit_code: i32,
}

fn default_liveness_interval_ms() -> u64 {
    1000
}

fn default_liveness_exit_code() -> i32 {
    1
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_liveness_interval_ms(),
            exit_code: default_liveness_exit_code(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate the configuration from a JSON file.
    ///
    /// The parser accepts JSON5, so plain JSON documents and documents
    /// with comments or unquoted keys both work.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = json5::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field values after parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.host.is_empty() {
            return Err(ConfigError::invalid("settings.host must not be empty"));
        }
        self.settings.host_port()?;

        if self.settings.topic.is_empty() {
            return Err(ConfigError::invalid("settings.topic must not be empty"));
        }
        if self.settings.qos > 2 {
            return Err(ConfigError::invalid(format!(
                "settings.qos must be 0, 1 or 2 (got {})",
                self.settings.qos
            )));
        }

        if self.liveness.interval_ms == 0 {
            return Err(ConfigError::invalid("liveness.interval_ms must be positive"));
        }
        if self.liveness.exit_code == 0 {
            return Err(ConfigError::invalid("liveness.exit_code must be non-zero"));
        }

        Ok(())
    }
}
