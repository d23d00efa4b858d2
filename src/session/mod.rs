//! Per-connection session state machine
//!
//! Tracks one connection from accept to teardown:
//! `Anonymous → Identified → Closed`. A connection starts anonymous, becomes
//! identified on an explicit login intent, and closes on transport close or
//! explicit logout. A reconnecting client is a brand-new anonymous session
//! that must re-login and re-join its rooms.

use std::net::SocketAddr;
use std::time::Instant;

use crate::protocol::{ConnId, UserId};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no user identity bound yet
    Anonymous,
    /// Login received; connection carries a user identity
    Identified,
    /// Transport closed or logout received
    Closed,
}

/// State of one live connection
#[derive(Debug)]
pub struct SessionState {
    /// This connection's identifier
    pub conn_id: ConnId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Bound user identity (set by login)
    pub user_id: Option<UserId>,

    /// When the connection was accepted
    pub connected_at: Instant,
}

impl SessionState {
    /// Create a new anonymous session
    pub fn new(conn_id: ConnId, peer_addr: SocketAddr) -> Self {
        Self {
            conn_id,
            peer_addr,
            phase: SessionPhase::Anonymous,
            user_id: None,
            connected_at: Instant::now(),
        }
    }

    /// Bind a user identity; a repeated login rebinds
    pub fn identify(&mut self, user_id: impl Into<UserId>) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Identified;
            self.user_id = Some(user_id.into());
        }
    }

    /// Mark the session closed
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Whether a login has been received
    pub fn is_identified(&self) -> bool {
        self.phase == SessionPhase::Identified
    }

    /// How long this connection has been open
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
