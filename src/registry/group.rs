//! Group-chat room table
//!
//! Membership is symmetric: no host, no terminal end operation. A room is
//! created lazily the first time someone joins and removed when its last
//! member leaves. Membership is keyed by connection so the disconnect sweep
//! can find a connection's rooms without extra bookkeeping.

use std::collections::HashMap;

use crate::protocol::{ConnId, GroupId, UserId};

/// Outcome of a join-or-create operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupJoin {
    /// Whether the room was created by this join
    pub created: bool,
    /// Whether the connection was already a member (idempotent no-op)
    pub already_member: bool,
    /// Member count after the join
    pub count: usize,
}

/// Outcome of a leave (explicit or swept)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLeave {
    /// The user the departed connection had registered as
    pub user_id: UserId,
    /// Member count after the leave
    pub count: usize,
    /// Remaining member connections, for the departure broadcast
    pub remaining: Vec<ConnId>,
}

/// Table of group-chat rooms with live subscribers
#[derive(Debug, Default)]
pub struct GroupRooms {
    rooms: HashMap<GroupId, HashMap<ConnId, UserId>>,
}

impl GroupRooms {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent membership registration with lazy room creation
    pub fn join_or_create(
        &mut self,
        group_id: impl Into<GroupId>,
        conn: ConnId,
        member_id: impl Into<UserId>,
    ) -> GroupJoin {
        let group_id = group_id.into();
        let created = !self.rooms.contains_key(&group_id);
        let members = self.rooms.entry(group_id.clone()).or_default();

        let already_member = members.contains_key(&conn);
        if !already_member {
            members.insert(conn, member_id.into());
        }
        let count = members.len();

        if created {
            tracing::info!(group = %group_id, "Group room created");
        }
        tracing::debug!(group = %group_id, conn = %conn, members = count, "Group member joined");

        GroupJoin {
            created,
            already_member,
            count,
        }
    }

    /// Remove a connection's membership; no error if absent
    ///
    /// The room itself is removed once empty.
    pub fn leave(&mut self, group_id: &str, conn: ConnId) -> Option<GroupLeave> {
        let members = self.rooms.get_mut(group_id)?;
        let user_id = members.remove(&conn)?;

        let outcome = GroupLeave {
            user_id,
            count: members.len(),
            remaining: members.keys().copied().collect(),
        };

        if members.is_empty() {
            self.rooms.remove(group_id);
            tracing::info!(group = %group_id, "Group room removed (empty)");
        } else {
            tracing::debug!(group = %group_id, conn = %conn, members = outcome.count, "Group member left");
        }

        Some(outcome)
    }

    /// Member connections currently joined to a group
    pub fn members(&self, group_id: &str) -> Vec<ConnId> {
        self.rooms
            .get(group_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a connection is joined to a group
    pub fn is_member(&self, group_id: &str, conn: ConnId) -> bool {
        self.rooms
            .get(group_id)
            .is_some_and(|m| m.contains_key(&conn))
    }

    /// Number of rooms with live subscribers
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Remove a disconnected connection from every room it joined
    pub fn sweep(&mut self, conn: ConnId) -> Vec<(GroupId, GroupLeave)> {
        let joined: Vec<GroupId> = self
            .rooms
            .iter()
            .filter(|(_, members)| members.contains_key(&conn))
            .map(|(id, _)| id.clone())
            .collect();

        joined
            .into_iter()
            .filter_map(|group_id| {
                self.leave(&group_id, conn)
                    .map(|outcome| (group_id, outcome))
            })
            .collect()
    }
}
