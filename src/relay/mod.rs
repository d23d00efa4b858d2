//! Message and signaling relays
//!
//! Thin orchestration on top of [`Hub`](crate::hub::Hub): chat relays pair a
//! live broadcast with a background persistence write, signaling relays
//! forward opaque payloads between peer connections. Neither inspects payload
//! contents.

pub mod chat;
pub mod signaling;

pub use chat::{relay_group, relay_personal, PersistHandle};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, for message and notification timestamps
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
