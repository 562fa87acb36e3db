//! Bonfire subscription client.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::frame::{self, BonfireEvent};

/// Delay between reconnection attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the event channel handed to the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Client for the Bonfire publish/subscribe addon.
///
/// Register channels with [`subscribe`](Self::subscribe), then call
/// [`start`](Self::start) to open the connection and obtain the event
/// stream. The client keeps the connection alive on its own: after any
/// failure it waits [`RECONNECT_DELAY`], reconnects and re-announces its
/// subscriptions. Events arriving on channels that were never subscribed
/// are dropped.
#[derive(Debug, Clone)]
pub struct BonfireClient {
    address: String,
    channels: Vec<String>,
}

impl BonfireClient {
    /// Create a client for the addon listening at `address` (`host:port`).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            channels: Vec::new(),
        }
    }

    /// Register interest in `channel`.
    pub fn subscribe(&mut self, channel: impl Into<String>) {
        self.channels.push(channel.into());
    }

    /// Spawn the connection task and return the event stream.
    ///
    /// The task runs until the receiver is dropped. Connection failures
    /// are logged and retried, never surfaced to the consumer.
    pub fn start(self) -> mpsc::Receiver<BonfireEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(run_connection(self.address, self.channels, tx));
        rx
    }
}

/// Connection task: serve one connection at a time, reconnecting forever.
async fn run_connection(address: String, channels: Vec<String>, tx: mpsc::Sender<BonfireEvent>) {
    loop {
        match pump_events(&address, &channels, &tx).await {
            Ok(()) => {
                debug!("Bonfire event receiver dropped, stopping client");
                return;
            }
            Err(e) => {
                warn!("Bonfire connection to {} failed: {}", address, e);
            }
        }
        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Serve one connection until it drops or the consumer goes away.
///
/// Returns `Ok(())` only when the receiver has been dropped; every
/// connection-level failure, including a clean close by the addon, is
/// reported as an error so the caller reconnects.
async fn pump_events(
    address: &str,
    channels: &[String],
    tx: &mpsc::Sender<BonfireEvent>,
) -> io::Result<()> {
    let mut stream = TcpStream::connect(address).await?;
    info!("Connected to Bonfire at {}", address);

    for channel in channels {
        stream
            .write_all(frame::subscribe_line(channel).as_bytes())
            .await?;
        debug!("Subscribed to Bonfire channel '{}'", channel);
    }

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        match frame::decode_event(&line) {
            Ok(event) => {
                if !channels.contains(&event.channel) {
                    trace!("Skipping event on unsubscribed channel '{}'", event.channel);
                    continue;
                }
                if tx.send(event).await.is_err() {
                    return Ok(());
                }
            }
            Err(e) => {
                warn!("Ignoring malformed Bonfire frame: {}", e);
            }
        }
    }

    Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed by addon",
    ))
}
