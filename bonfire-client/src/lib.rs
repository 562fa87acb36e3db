//! Subscription client for the Bonfire publish/subscribe addon.
//!
//! Bonfire exposes named channels over a TCP endpoint. A subscriber opens a
//! connection, announces the channels it wants, and then receives one frame
//! per published event. Payloads are opaque JSON-encoded strings; this crate
//! delivers them without inspecting their contents.
//!
//! Only the subscription side is implemented here. The client owns its
//! connection lifecycle: it reconnects after any failure and re-announces
//! its subscriptions, so consumers just read from the returned channel.
//!
//! ```no_run
//! use bonfire_client::BonfireClient;
//!
//! # async fn run() {
//! let mut client = BonfireClient::new("127.0.0.1:4660");
//! client.subscribe("tag/update");
//! let mut events = client.start();
//! while let Some(event) = events.recv().await {
//!     println!("{}: {}", event.channel, event.payload);
//! }
//! # }
//! ```

mod client;
mod frame;

pub use client::BonfireClient;
pub use frame::BonfireEvent;
