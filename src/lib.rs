//! # sockhub
//!
//! Real-time coordination core for a social platform: presence tracking,
//! personal and group chat relay, WebRTC call signaling passthrough, and
//! live-stream room membership with host/viewer fan-out.
//!
//! The crate is transport-thin by design. Clients connect over TCP and
//! exchange newline-delimited JSON events (see [`protocol`]). Everything the
//! server knows lives in one process: the [`hub::Hub`] owns the presence
//! directory, the room tables, and the per-connection outbound senders, and
//! every mutation of that state happens under a single lock, so registry
//! operations are atomic with respect to each other.
//!
//! # Architecture
//!
//! ```text
//!   TCP accept ──► Connection (read/write tasks)
//!                      │  ClientEvent
//!                      ▼
//!                  gateway::dispatch ──► relay::{chat, signaling}
//!                      │                       │
//!                      ▼                       ▼
//!                  Hub { PresenceDirectory, LiveRooms, GroupRooms, senders }
//!                      │
//!                      ▼  ServerEvent fan-out (per-connection mpsc)
//! ```
//!
//! Delivery is at-most-once and best-effort: a relay either finds its target
//! connection registered or it silently delivers nothing. Chat persistence
//! (via [`store::MessageStore`]) runs concurrently with the broadcast and is
//! never awaited before it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sockhub::{ServerConfig, SocketServer};
//! use sockhub::store::NullStore;
//!
//! #[tokio::main]
//! async fn main() -> sockhub::Result<()> {
//!     let config = ServerConfig::default().max_connections(1024);
//!     let server = SocketServer::new(config, Arc::new(NullStore));
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod hub;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod store;

pub use error::{Error, Result};
pub use hub::Hub;
pub use protocol::{ClientEvent, ConnId, ServerEvent};
pub use server::{ServerConfig, SocketServer};
