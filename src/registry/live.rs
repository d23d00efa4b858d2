//! Live-stream room table
//!
//! Each room has exactly one host connection and a set of viewer
//! connections. Viewer membership uses set semantics: joining twice counts
//! once. Only the recorded host may end a room, and a host disconnect ends
//! the room for every member.

use std::collections::{HashMap, HashSet};

use super::error::RegistryError;
use crate::protocol::{ConnId, RoomId};

/// A single live-stream room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRoom {
    /// The host's connection
    pub host: ConnId,
    /// Viewer connections (set semantics, insertion order irrelevant)
    viewers: HashSet<ConnId>,
}

impl LiveRoom {
    fn new(host: ConnId) -> Self {
        Self {
            host,
            viewers: HashSet::new(),
        }
    }

    /// Add a viewer; returns the updated count. Idempotent.
    pub fn add_viewer(&mut self, viewer: ConnId) -> usize {
        self.viewers.insert(viewer);
        self.viewers.len()
    }

    /// Remove a viewer if present; returns the updated count
    pub fn remove_viewer(&mut self, viewer: ConnId) -> usize {
        self.viewers.remove(&viewer);
        self.viewers.len()
    }

    /// Current viewer count
    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Whether this connection is a viewer of the room
    pub fn has_viewer(&self, conn: ConnId) -> bool {
        self.viewers.contains(&conn)
    }

    /// Viewer connections
    pub fn viewers(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.viewers.iter().copied()
    }

    /// Every member connection: host plus viewers
    pub fn members(&self) -> Vec<ConnId> {
        let mut out = Vec::with_capacity(self.viewers.len() + 1);
        out.push(self.host);
        out.extend(self.viewers.iter().copied());
        out
    }
}

/// What a disconnect sweep did to the live-room table
#[derive(Debug, Default)]
pub struct LiveSweep {
    /// Rooms deleted because the swept connection was their host; each entry
    /// carries the room id and the members still to be notified
    pub ended: Vec<(RoomId, Vec<ConnId>)>,
    /// Rooms the swept connection left as a viewer: room id, updated count,
    /// and the remaining members to receive the count broadcast
    pub departed: Vec<(RoomId, usize, Vec<ConnId>)>,
}

/// Table of active live-stream rooms
#[derive(Debug, Default)]
pub struct LiveRooms {
    rooms: HashMap<RoomId, LiveRoom>,
}

impl LiveRooms {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new room under a host-chosen id
    ///
    /// A colliding id force-terminates the prior room: the displaced room is
    /// returned so the caller can notify its members with `hostLeft` before
    /// the new room takes over. Never a silent eviction.
    pub fn create(&mut self, room_id: impl Into<RoomId>, host: ConnId) -> Option<LiveRoom> {
        let room_id = room_id.into();
        let displaced = self.rooms.insert(room_id.clone(), LiveRoom::new(host));
        if displaced.is_some() {
            tracing::warn!(room = %room_id, host = %host, "Room id collision, prior room terminated");
        } else {
            tracing::info!(room = %room_id, host = %host, "Live room created");
        }
        displaced
    }

    /// Add a viewer to a room; returns the updated viewer count
    pub fn join(&mut self, room_id: &str, viewer: ConnId) -> Result<usize, RegistryError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))?;

        let count = room.add_viewer(viewer);
        tracing::info!(room = %room_id, viewer = %viewer, viewers = count, "Viewer joined");
        Ok(count)
    }

    /// Remove a viewer if present; returns the updated count, or `None` if
    /// the room does not exist or the connection was not a viewer
    pub fn leave(&mut self, room_id: &str, viewer: ConnId) -> Option<usize> {
        let room = self.rooms.get_mut(room_id)?;
        if !room.has_viewer(viewer) {
            return None;
        }
        let count = room.remove_viewer(viewer);
        tracing::debug!(room = %room_id, viewer = %viewer, viewers = count, "Viewer left");
        Some(count)
    }

    /// End a room; only effective if `caller` is the recorded host
    ///
    /// Returns the deleted room so the caller can broadcast the terminal
    /// `hostLeft` event to its members.
    pub fn end(&mut self, room_id: &str, caller: ConnId) -> Result<LiveRoom, RegistryError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))?;

        if room.host != caller {
            return Err(RegistryError::NotHost(room_id.to_string()));
        }

        let room = self.rooms.remove(room_id).unwrap_or_else(|| unreachable!());
        tracing::info!(room = %room_id, viewers = room.viewer_count(), "Live room ended by host");
        Ok(room)
    }

    /// Look up a room
    pub fn room(&self, room_id: &str) -> Option<&LiveRoom> {
        self.rooms.get(room_id)
    }

    /// The host of a room, if it exists
    pub fn host_of(&self, room_id: &str) -> Option<ConnId> {
        self.rooms.get(room_id).map(|r| r.host)
    }

    /// Number of active rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Remove every trace of a disconnected connection
    ///
    /// Rooms hosted by it are deleted; rooms it viewed lose one viewer.
    pub fn sweep(&mut self, conn: ConnId) -> LiveSweep {
        let mut sweep = LiveSweep::default();

        let hosted: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.host == conn)
            .map(|(id, _)| id.clone())
            .collect();

        for room_id in hosted {
            if let Some(room) = self.rooms.remove(&room_id) {
                tracing::info!(room = %room_id, host = %conn, "Host disconnected, room ended");
                sweep
                    .ended
                    .push((room_id, room.viewers().collect()));
            }
        }

        for (room_id, room) in self.rooms.iter_mut() {
            if room.has_viewer(conn) {
                let count = room.remove_viewer(conn);
                tracing::debug!(room = %room_id, viewer = %conn, viewers = count, "Viewer swept");
                sweep.departed.push((room_id.clone(), count, room.members()));
            }
        }

        sweep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let mut rooms = LiveRooms::new();
        rooms.create("room1", ConnId(1));

        assert_eq!(rooms.join("room1", ConnId(2)).unwrap(), 1);
        assert_eq!(rooms.join("room1", ConnId(2)).unwrap(), 1);
        assert_eq!(rooms.join("room1", ConnId(3)).unwrap(), 2);
    }

    #[test]
    fn test_join_missing_room_is_not_found() {
        let mut rooms = LiveRooms::new();
        assert_eq!(
            rooms.join("room1", ConnId(2)),
            Err(RegistryError::RoomNotFound("room1".into()))
        );
    }

    #[test]
    fn test_end_is_host_only() {
        let mut rooms = LiveRooms::new();
        rooms.create("room1", ConnId(1));
        rooms.join("room1", ConnId(2)).unwrap();

        // Non-host call leaves membership and existence unchanged
        assert_eq!(
            rooms.end("room1", ConnId(2)),
            Err(RegistryError::NotHost("room1".into()))
        );
        assert_eq!(rooms.room("room1").unwrap().viewer_count(), 1);

        let ended = rooms.end("room1", ConnId(1)).unwrap();
        assert_eq!(ended.viewer_count(), 1);
        assert!(rooms.room("room1").is_none());
    }

    #[test]
    fn test_create_collision_returns_displaced_room() {
        let mut rooms = LiveRooms::new();
        rooms.create("room1", ConnId(1));
        rooms.join("room1", ConnId(2)).unwrap();

        let displaced = rooms.create("room1", ConnId(9)).unwrap();
        assert_eq!(displaced.host, ConnId(1));
        assert_eq!(displaced.viewer_count(), 1);

        // New room starts empty under the new host
        assert_eq!(rooms.host_of("room1"), Some(ConnId(9)));
        assert_eq!(rooms.room("room1").unwrap().viewer_count(), 0);
    }

    #[test]
    fn test_sweep_host_and_viewer_roles() {
        let mut rooms = LiveRooms::new();
        // Conn 1 hosts room A and views room B
        rooms.create("a", ConnId(1));
        rooms.join("a", ConnId(5)).unwrap();
        rooms.create("b", ConnId(2));
        rooms.join("b", ConnId(1)).unwrap();
        rooms.join("b", ConnId(3)).unwrap();

        let sweep = rooms.sweep(ConnId(1));

        assert_eq!(sweep.ended.len(), 1);
        assert_eq!(sweep.ended[0].0, "a");
        assert_eq!(sweep.ended[0].1, vec![ConnId(5)]);

        assert_eq!(sweep.departed.len(), 1);
        let (room_id, count, _) = &sweep.departed[0];
        assert_eq!(room_id, "b");
        assert_eq!(*count, 1);

        assert!(rooms.room("a").is_none());
        assert_eq!(rooms.room("b").unwrap().viewer_count(), 1);
    }

    #[test]
    fn test_leave_absent_viewer_is_none() {
        let mut rooms = LiveRooms::new();
        rooms.create("room1", ConnId(1));
        assert_eq!(rooms.leave("room1", ConnId(7)), None);
        assert_eq!(rooms.leave("ghost", ConnId(7)), None);
    }
}
