//! The bridge dispatcher: MQTT connection lifecycle plus event relay.

use std::time::Duration;

use bonfire_client::BonfireEvent;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, Settings};
use crate::event::{EventParseError, PublishedMessage, TagUpdateEvent};

/// The Bonfire channel carrying tag updates.
pub const TAG_UPDATE_CHANNEL: &str = "tag/update";

/// Delay before polling the MQTT event loop again after a connection
/// error. The client retries the connection on the next poll.
const REPOLL_DELAY: Duration = Duration::from_secs(1);

/// MQTT keep-alive interval.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Observed MQTT connection lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial connection attempt in progress.
    #[default]
    Connecting,
    /// CONNACK received, publishes will be attempted.
    Connected,
    /// Connection lost, the client is retrying.
    Reconnecting,
}

impl ConnectionState {
    /// Check whether publishes should be attempted.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// What the dispatcher decided to do with one inbound payload.
#[derive(Debug)]
pub enum Outcome {
    /// Connected and parsed: publish this message.
    Publish(PublishedMessage),
    /// Not connected: the event is discarded.
    NotConnected,
    /// The payload did not parse as a tag update.
    Rejected(EventParseError),
}

/// Decide what to do with one inbound payload.
///
/// The whole translation step with no I/O attached: check the connection
/// gate, then parse and rename.
pub fn evaluate(connected: bool, payload: &str) -> Outcome {
    if !connected {
        return Outcome::NotConnected;
    }
    match TagUpdateEvent::parse(payload) {
        Ok(event) => Outcome::Publish(PublishedMessage::from(event)),
        Err(e) => Outcome::Rejected(e),
    }
}

/// The bridge controller.
///
/// Owns the MQTT client, its event loop, the observed connection state and
/// the inbound Bonfire stream. A single task drives all of it, so lifecycle
/// updates and event handling never overlap.
pub struct MqttRelay {
    settings: Settings,
    client: AsyncClient,
    event_loop: EventLoop,
    events: mpsc::Receiver<BonfireEvent>,
    state: ConnectionState,
}

impl MqttRelay {
    /// Build the MQTT client and attach the Bonfire event stream.
    pub fn new(
        settings: Settings,
        events: mpsc::Receiver<BonfireEvent>,
    ) -> Result<Self, ConfigError> {
        let (host, port) = settings.host_port()?;
        let mut options = MqttOptions::new(&settings.client_id, host, port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, event_loop) = AsyncClient::new(options, 64);

        Ok(Self {
            settings,
            client,
            event_loop,
            events,
            state: ConnectionState::default(),
        })
    }

    /// Run the dispatcher until the Bonfire stream ends.
    pub async fn run(mut self) {
        info!("Connecting to MQTT broker at {}", self.settings.host);

        loop {
            tokio::select! {
                polled = self.event_loop.poll() => {
                    if let Some(delay) = self.on_mqtt_event(polled) {
                        tokio::time::sleep(delay).await;
                    }
                }
                event = self.events.recv() => match event {
                    Some(event) => self.on_bonfire_event(event),
                    None => {
                        warn!("Bonfire event stream closed, stopping relay");
                        return;
                    }
                },
            }
        }
    }

    /// Track one MQTT event-loop result, logging lifecycle transitions.
    ///
    /// Returns a delay to apply before the next poll.
    fn on_mqtt_event(&mut self, polled: Result<Event, ConnectionError>) -> Option<Duration> {
        match polled {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                match self.state {
                    ConnectionState::Connecting => info!("Connected to MQTT broker"),
                    _ => info!("Reconnected to MQTT broker"),
                }
                self.state = ConnectionState::Connected;
                None
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!("MQTT broker requested disconnect");
                self.state = ConnectionState::Reconnecting;
                None
            }
            Ok(_) => None,
            Err(e) => {
                error!("MQTT connection error: {}", e);
                if self.state.is_connected() {
                    info!("MQTT connection closed");
                }
                self.state = ConnectionState::Reconnecting;
                Some(REPOLL_DELAY)
            }
        }
    }

    /// Handle one inbound Bonfire event.
    fn on_bonfire_event(&mut self, event: BonfireEvent) {
        if event.channel != TAG_UPDATE_CHANNEL {
            debug!("Ignoring event on unexpected channel '{}'", event.channel);
            return;
        }

        match evaluate(self.state.is_connected(), &event.payload) {
            Outcome::Publish(message) => self.publish(message),
            Outcome::NotConnected => {
                debug!("MQTT not connected, dropping tag update");
            }
            Outcome::Rejected(e) => {
                warn!("Dropping tag update: {}", e);
            }
        }
    }

    /// Serialize and enqueue one outbound message.
    ///
    /// Fire-and-forget: the delivery result is not awaited, and a full
    /// request queue only costs the one message.
    fn publish(&self, message: PublishedMessage) {
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize outbound message: {}", e);
                return;
            }
        };

        match self.client.try_publish(
            self.settings.topic.as_str(),
            qos_level(self.settings.qos),
            self.settings.retain,
            payload,
        ) {
            Ok(()) => debug!(
                "Published tag '{}' to '{}'",
                message.tag, self.settings.topic
            ),
            Err(e) => warn!("Failed to enqueue MQTT publish: {}", e),
        }
    }
}

/// Map the configured QoS integer onto the client's levels.
fn qos_level(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}
