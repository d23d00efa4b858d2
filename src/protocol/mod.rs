//! Wire protocol: typed events and framing
//!
//! Clients speak newline-delimited JSON. Each line is one event object tagged
//! by an `event` field, e.g. `{"event":"login","userId":"ana@example.com"}`.
//! Inbound intents are [`ClientEvent`], outbound notifications are
//! [`ServerEvent`]; both are exhaustive sum types so every intent has a
//! handler and payload shapes are validated before use.
//!
//! Event names on the wire are load-bearing: existing clients depend on them,
//! so the serde renames here must not change.

pub mod codec;
pub mod events;

pub use codec::LineCodec;
pub use events::{
    ClientEvent, ErrorKind, MediaActive, MediaKind, NotificationPayload, NotificationSender,
    ServerEvent,
};

use serde::{Deserialize, Serialize};

/// Stable application-level user identity (an email address)
pub type UserId = String;

/// Identifier of a pre-existing group, owned by the external record store
pub type GroupId = String;

/// Host-chosen identifier of a live-stream room
pub type RoomId = String;

/// Opaque identifier of one physical connection
///
/// Allocated by the listener at accept time and sent to the client in the
/// `connectionId` handshake event. Clients use it for peer-to-peer targeting
/// (call signaling addresses connections, not users).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(pub u64);

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ConnId {
    fn from(id: u64) -> Self {
        ConnId(id)
    }
}
