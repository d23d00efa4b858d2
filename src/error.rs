//! Crate-level error type
//!
//! Registry and store errors carry their own enums; this type is what the
//! server surface (listener, connection loop) propagates.

use crate::registry::RegistryError;
use crate::store::StoreError;

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for server operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or listener I/O failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire payload could not be encoded or decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A client buffered more than the per-frame limit without a delimiter
    #[error("frame exceeds maximum size of {limit} bytes")]
    FrameTooLarge { limit: usize },

    /// Room registry precondition failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// External record store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}
