//! MQTT bridge for Bonfire tag-update events.
//!
//! This bridge subscribes to the Bonfire `tag/update` channel and
//! republishes every event to a configured MQTT topic.

use anyhow::{Context, Result};
use bonfire_client::BonfireClient;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bonfire_bridge_mqtt::config::{BridgeConfig, LoggingConfig};
use bonfire_bridge_mqtt::liveness::ParentWatch;
use bonfire_bridge_mqtt::relay::{MqttRelay, TAG_UPDATE_CHANNEL};

/// MQTT bridge for Bonfire tag-update events.
#[derive(Parser, Debug)]
#[command(name = "bonfire-bridge-mqtt")]
#[command(about = "Relays Bonfire tag updates to an MQTT broker")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON format)
    #[arg(short = 'j', long)]
    config: PathBuf,

    /// Bonfire addon address (host:port)
    #[arg(short = 'a', long)]
    address: String,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = BridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let log_config = LoggingConfig {
        level: args
            .log_level
            .clone()
            .unwrap_or_else(|| config.logging.level.clone()),
        format: config.logging.format,
    };
    bonfire_bridge_mqtt::init_tracing(&log_config)?;

    info!("Starting bonfire-bridge-mqtt");
    info!("Loaded configuration from {:?}", args.config);

    // Watch the parent process; the bridge dies with its supervisor
    let watch = ParentWatch::new(&config.liveness);
    tokio::spawn(watch.watch());

    // Subscribe to Bonfire tag updates
    info!("Subscribing to Bonfire at {}", args.address);
    let mut bonfire = BonfireClient::new(args.address.as_str());
    bonfire.subscribe(TAG_UPDATE_CHANNEL);
    let events = bonfire.start();

    // Relay events to MQTT until shutdown
    let relay = MqttRelay::new(config.settings, events)?;

    tokio::select! {
        _ = relay.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Bonfire MQTT bridge stopped");
    Ok(())
}
