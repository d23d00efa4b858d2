//! Registry error types

use crate::protocol::{ErrorKind, RoomId};

/// Error type for room registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The room does not exist
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// The caller is not the room's recorded host
    #[error("Not the host of room: {0}")]
    NotHost(RoomId),
}

impl RegistryError {
    /// Wire-level error category for the `error` event
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::RoomNotFound(_) => ErrorKind::NotFound,
            RegistryError::NotHost(_) => ErrorKind::Forbidden,
        }
    }
}
