//! Wire format for the Bonfire subscription protocol.
//!
//! The addon speaks newline-delimited JSON. After connecting, the client
//! writes one subscribe line per channel and the addon pushes one event
//! line per published payload.

use serde::{Deserialize, Serialize};

/// One event pushed by the addon on a subscribed channel.
///
/// The payload is the JSON-encoded string the publisher supplied. The
/// client forwards it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonfireEvent {
    /// Channel the event was published on.
    pub channel: String,
    /// Publisher payload, handed over without inspection.
    pub payload: String,
}

/// Encode the subscribe request for `channel` as a single wire line.
pub(crate) fn subscribe_line(channel: &str) -> String {
    let mut line = serde_json::json!({ "op": "subscribe", "channel": channel }).to_string();
    line.push('\n');
    line
}

/// Decode one wire line into an event.
pub(crate) fn decode_event(line: &str) -> Result<BonfireEvent, serde_json::Error> {
    serde_json::from_str(line)
}
