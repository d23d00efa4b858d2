//! Presence directory
//!
//! Live mapping from user identity (email) to the connection currently
//! serving it. At most one entry per user: the model supports a single active
//! session, and a later login silently evicts the registry record of the
//! previous connection (the previous physical connection is not closed).
//!
//! The directory is a pure table. Broadcasting `userConnected` /
//! `userDisconnected` is the hub's job, so tests can exercise presence
//! semantics in isolation.

use std::collections::HashMap;

use crate::protocol::{ConnId, UserId};

/// User-to-connection presence table
#[derive(Debug, Default)]
pub struct PresenceDirectory {
    users: HashMap<UserId, ConnId>,
}

impl PresenceDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional upsert; returns the evicted connection id, if any
    pub fn set(&mut self, user_id: impl Into<UserId>, conn_id: ConnId) -> Option<ConnId> {
        self.users.insert(user_id.into(), conn_id)
    }

    /// Remove the mapping if present; returns whether an entry existed
    pub fn clear(&mut self, user_id: &str) -> bool {
        self.users.remove(user_id).is_some()
    }

    /// Resolve a user's live connection
    pub fn lookup(&self, user_id: &str) -> Option<ConnId> {
        self.users.get(user_id).copied()
    }

    /// Whether the user has a presence entry
    pub fn is_online(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Reverse lookup used by the disconnect sweep: the user whose entry
    /// points at this connection, if any
    pub fn user_for_conn(&self, conn_id: ConnId) -> Option<&UserId> {
        self.users
            .iter()
            .find(|(_, c)| **c == conn_id)
            .map(|(u, _)| u)
    }

    /// Remove the entry whose connection matches; returns the swept user
    pub fn remove_conn(&mut self, conn_id: ConnId) -> Option<UserId> {
        let user = self.user_for_conn(conn_id).cloned()?;
        self.users.remove(&user);
        Some(user)
    }

    /// Number of users currently online
    pub fn online_count(&self) -> usize {
        self.users.len()
    }
}
