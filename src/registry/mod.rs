//! Room registry
//!
//! Two independently-keyed in-memory tables, one per room kind:
//!
//! - [`LiveRooms`]: live-stream rooms with a single host and a set of
//!   viewers. Created and terminated by the host; a host disconnect ends the
//!   room for everyone.
//! - [`GroupRooms`]: symmetric group-chat membership keyed by a pre-existing
//!   group id owned by the external record store. No host, no terminal end
//!   operation; a room is created lazily on first join and torn down
//!   implicitly when its last member leaves.
//!
//! The tables hold membership only. Event fan-out to the affected connections
//! is the hub's job, driven by the outcome values these operations return.

pub mod error;
pub mod group;
pub mod live;

pub use error::RegistryError;
pub use group::{GroupJoin, GroupLeave, GroupRooms};
pub use live::{LiveRoom, LiveRooms, LiveSweep};
