//! Connection hub
//!
//! One long-lived [`Hub`] per server process owns everything the real-time
//! layer knows: the presence directory, both room tables, and the outbound
//! sender of every live connection. All of it sits behind a single mutex, so
//! registry mutations are atomic with respect to each other; nothing inside
//! the lock performs I/O (sends go through unbounded channels and never
//! block).
//!
//! Delivery is at-most-once, best-effort: a send to a connection that is gone
//! silently delivers nothing. No delivery confirmation, no retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use crate::presence::PresenceDirectory;
use crate::protocol::{ConnId, NotificationPayload, ServerEvent};
use crate::registry::{GroupRooms, LiveRooms, RegistryError};

/// Outbound channel of one connection
pub type Outbound = mpsc::UnboundedSender<ServerEvent>;

/// Point-in-time counters, logged periodically by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Live connections (identified or not)
    pub connections: usize,
    /// Users with a presence entry
    pub online_users: usize,
    /// Active live-stream rooms
    pub live_rooms: usize,
    /// Group rooms with live subscribers
    pub group_rooms: usize,
}

struct HubInner {
    senders: HashMap<ConnId, Outbound>,
    presence: PresenceDirectory,
    live: LiveRooms,
    groups: GroupRooms,
}

impl HubInner {
    fn send(&self, conn: ConnId, event: ServerEvent) -> bool {
        match self.senders.get(&conn) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn send_many(&self, conns: &[ConnId], event: &ServerEvent) {
        for conn in conns {
            if let Some(tx) = self.senders.get(conn) {
                let _ = tx.send(event.clone());
            }
        }
    }

    fn broadcast_except(&self, except: ConnId, event: &ServerEvent) {
        for (conn, tx) in &self.senders {
            if *conn != except {
                let _ = tx.send(event.clone());
            }
        }
    }
}

/// Process-wide coordination object for the real-time layer
pub struct Hub {
    inner: Mutex<HubInner>,
    next_conn_id: AtomicU64,
}

impl Hub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner {
                senders: HashMap::new(),
                presence: PresenceDirectory::new(),
                live: LiveRooms::new(),
                groups: GroupRooms::new(),
            }),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Allocate the identifier for a newly accepted connection
    pub fn allocate_conn_id(&self) -> ConnId {
        ConnId(self.next_conn_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a connection's outbound channel and send it its own id
    /// (clients use the id to resolve peer-to-peer targeting)
    pub async fn attach(&self, conn: ConnId, sender: Outbound) {
        let _ = sender.send(ServerEvent::ConnectionId {
            connection_id: conn,
        });
        let mut inner = self.inner.lock().await;
        inner.senders.insert(conn, sender);
        tracing::debug!(conn = %conn, "Connection attached");
    }

    /// Send one event to one connection; false if it is gone
    pub async fn send_to(&self, conn: ConnId, event: ServerEvent) -> bool {
        self.inner.lock().await.send(conn, event)
    }

    /// Send one event to a user's live connection, resolved through presence
    pub async fn send_to_user(&self, user_id: &str, event: ServerEvent) -> bool {
        let inner = self.inner.lock().await;
        match inner.presence.lookup(user_id) {
            Some(conn) => inner.send(conn, event),
            None => false,
        }
    }

    /// Fan an event out to every connection except one
    pub async fn broadcast_except(&self, except: ConnId, event: ServerEvent) {
        self.inner.lock().await.broadcast_except(except, &event);
    }

    // === Presence ===

    /// Enter the user into the presence directory and tell everyone else
    pub async fn login(&self, conn: ConnId, user_id: &str) {
        let mut inner = self.inner.lock().await;
        let evicted = inner.presence.set(user_id, conn);
        if let Some(old) = evicted {
            tracing::info!(user = %user_id, old_conn = %old, conn = %conn, "Presence overwritten by new login");
        } else {
            tracing::info!(user = %user_id, conn = %conn, "User logged in");
        }
        inner.broadcast_except(
            conn,
            &ServerEvent::UserConnected {
                user_id: user_id.to_string(),
            },
        );
    }

    /// Remove the user's presence entry; no-op if absent
    pub async fn logout(&self, conn: ConnId, user_id: &str) {
        let mut inner = self.inner.lock().await;
        if inner.presence.clear(user_id) {
            tracing::info!(user = %user_id, conn = %conn, "User logged out");
            inner.broadcast_except(
                conn,
                &ServerEvent::UserDisconnected {
                    user_id: user_id.to_string(),
                },
            );
        }
    }

    /// Whether the user has a presence entry
    pub async fn is_online(&self, user_id: &str) -> bool {
        self.inner.lock().await.presence.is_online(user_id)
    }

    /// The user's live connection id, or `None` if offline
    pub async fn resolve_connection(&self, user_id: &str) -> Option<ConnId> {
        self.inner.lock().await.presence.lookup(user_id)
    }

    // === Live-stream rooms ===

    /// Register a live room under a host-chosen id
    ///
    /// A colliding id force-terminates the prior room: its members receive
    /// `hostLeft` before the new room takes over.
    pub async fn create_live_room(&self, conn: ConnId, room_id: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(displaced) = inner.live.create(room_id, conn) {
            let event = ServerEvent::HostLeft {
                room_id: room_id.to_string(),
            };
            inner.send_many(&displaced.members(), &event);
        }
    }

    /// Add the caller as a viewer and broadcast the updated count to the room
    pub async fn join_live_room(&self, conn: ConnId, room_id: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        let count = inner.live.join(room_id, conn)?;
        let members = inner
            .live
            .room(room_id)
            .map(|r| r.members())
            .unwrap_or_default();
        inner.send_many(
            &members,
            &ServerEvent::ViewerCount {
                room_id: room_id.to_string(),
                count,
            },
        );
        Ok(())
    }

    /// Forward host signal data to every viewer of the room
    pub async fn host_signal(
        &self,
        conn: ConnId,
        room_id: &str,
        signal_data: Value,
    ) -> Result<(), RegistryError> {
        let inner = self.inner.lock().await;
        let room = inner
            .live
            .room(room_id)
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))?;
        if room.host != conn {
            return Err(RegistryError::NotHost(room_id.to_string()));
        }
        let viewers: Vec<ConnId> = room.viewers().collect();
        inner.send_many(&viewers, &ServerEvent::ReceiveHostSignal { signal_data });
        Ok(())
    }

    /// Forward viewer signal data back to the room's host
    pub async fn viewer_signal(
        &self,
        conn: ConnId,
        room_id: &str,
        signal: Value,
    ) -> Result<(), RegistryError> {
        let inner = self.inner.lock().await;
        let host = inner
            .live
            .host_of(room_id)
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))?;
        inner.send(
            host,
            ServerEvent::ViewerSignal {
                signal,
                viewer_id: conn,
            },
        );
        Ok(())
    }

    /// End a live room; host-only. Every member receives `hostLeft`.
    pub async fn end_livestream(&self, conn: ConnId, room_id: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        let room = inner.live.end(room_id, conn)?;
        inner.send_many(
            &room.members(),
            &ServerEvent::HostLeft {
                room_id: room_id.to_string(),
            },
        );
        Ok(())
    }

    // === Group rooms ===

    /// Idempotent group join with lazy room creation; the room is told who
    /// arrived
    pub async fn join_group(&self, conn: ConnId, group_id: &str, member_id: &str) {
        let mut inner = self.inner.lock().await;
        let outcome = inner.groups.join_or_create(group_id, conn, member_id);
        let members = inner.groups.members(group_id);
        inner.send_many(
            &members,
            &ServerEvent::ViewerJoined {
                group_id: group_id.to_string(),
                viewer_id: conn,
                user_id: member_id.to_string(),
                count: outcome.count,
            },
        );
    }

    /// Remove the caller's group membership; no error if absent
    pub async fn leave_group(&self, conn: ConnId, group_id: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(outcome) = inner.groups.leave(group_id, conn) {
            inner.send_many(
                &outcome.remaining,
                &ServerEvent::ViewerLeft {
                    group_id: group_id.to_string(),
                    viewer_id: conn,
                    count: outcome.count,
                },
            );
        }
    }

    /// Broadcast to every connection joined to the group, including the
    /// sender's own; returns the number of receivers
    pub async fn group_broadcast(&self, group_id: &str, event: ServerEvent) -> usize {
        let inner = self.inner.lock().await;
        let members = inner.groups.members(group_id);
        inner.send_many(&members, &event);
        members.len()
    }

    // === Notifications ===

    /// Push a notification to a user's live connection; false if offline
    /// (offline delivery is the record store's problem, not ours)
    pub async fn notify_user(&self, user_id: &str, payload: NotificationPayload) -> bool {
        let delivered = self
            .send_to_user(user_id, ServerEvent::Notification(payload))
            .await;
        if delivered {
            tracing::debug!(user = %user_id, "Notification delivered");
        } else {
            tracing::debug!(user = %user_id, "Notification skipped, user offline");
        }
        delivered
    }

    // === Teardown ===

    /// Disconnect sweep: remove every trace of a closed connection
    ///
    /// Order matters and is part of the contract: presence first, then
    /// live-stream rooms (host roles end the room, viewer roles decrement the
    /// count), then group memberships.
    pub async fn disconnect(&self, conn: ConnId) {
        let mut inner = self.inner.lock().await;
        inner.senders.remove(&conn);

        if let Some(user_id) = inner.presence.remove_conn(conn) {
            tracing::info!(user = %user_id, conn = %conn, "User disconnected");
            inner.broadcast_except(conn, &ServerEvent::UserDisconnected { user_id });
        }

        let live_sweep = inner.live.sweep(conn);
        for (room_id, members) in &live_sweep.ended {
            inner.send_many(
                members,
                &ServerEvent::HostLeft {
                    room_id: room_id.clone(),
                },
            );
        }
        for (room_id, count, members) in &live_sweep.departed {
            inner.send_many(
                members,
                &ServerEvent::ViewerCount {
                    room_id: room_id.clone(),
                    count: *count,
                },
            );
        }

        for (group_id, outcome) in inner.groups.sweep(conn) {
            inner.send_many(
                &outcome.remaining,
                &ServerEvent::ViewerLeft {
                    group_id,
                    viewer_id: conn,
                    count: outcome.count,
                },
            );
        }

        tracing::debug!(conn = %conn, "Connection swept");
    }

    /// Current counters
    pub async fn stats(&self) -> HubStats {
        let inner = self.inner.lock().await;
        HubStats {
            connections: inner.senders.len(),
            online_users: inner.presence.online_count(),
            live_rooms: inner.live.room_count(),
            group_rooms: inner.groups.room_count(),
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorKind, NotificationSender};

    /// Attach a fake connection and drain its handshake event
    async fn connect(hub: &Hub) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let conn = hub.allocate_conn_id();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.attach(conn, tx).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::ConnectionId {
                connection_id: conn
            }
        );
        (conn, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_login_broadcasts_to_others_only() {
        let hub = Hub::new();
        let (a, mut rx_a) = connect(&hub).await;
        let (_b, mut rx_b) = connect(&hub).await;

        hub.login(a, "ana@example.com").await;

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerEvent::UserConnected {
                user_id: "ana@example.com".into()
            }]
        );
        assert!(hub.is_online("ana@example.com").await);
        assert_eq!(hub.resolve_connection("ana@example.com").await, Some(a));
    }

    #[tokio::test]
    async fn test_livestream_lifecycle() {
        let hub = Hub::new();
        let (h, mut rx_h) = connect(&hub).await;
        let (v1, mut rx_v1) = connect(&hub).await;
        let (v2, mut rx_v2) = connect(&hub).await;
        let (v3, _rx_v3) = connect(&hub).await;

        hub.create_live_room(h, "room1").await;

        hub.join_live_room(v1, "room1").await.unwrap();
        assert_eq!(
            drain(&mut rx_v1),
            vec![ServerEvent::ViewerCount {
                room_id: "room1".into(),
                count: 1
            }]
        );

        hub.join_live_room(v2, "room1").await.unwrap();
        let host_events = drain(&mut rx_h);
        assert_eq!(
            host_events.last(),
            Some(&ServerEvent::ViewerCount {
                room_id: "room1".into(),
                count: 2
            })
        );

        hub.end_livestream(h, "room1").await.unwrap();
        assert!(drain(&mut rx_v1).contains(&ServerEvent::HostLeft {
            room_id: "room1".into()
        }));
        assert!(drain(&mut rx_v2).contains(&ServerEvent::HostLeft {
            room_id: "room1".into()
        }));

        // Room no longer exists
        assert_eq!(
            hub.join_live_room(v3, "room1").await,
            Err(RegistryError::RoomNotFound("room1".into()))
        );
    }

    #[tokio::test]
    async fn test_end_livestream_by_non_host_changes_nothing() {
        let hub = Hub::new();
        let (h, _rx_h) = connect(&hub).await;
        let (v1, mut rx_v1) = connect(&hub).await;

        hub.create_live_room(h, "room1").await;
        hub.join_live_room(v1, "room1").await.unwrap();
        drain(&mut rx_v1);

        let err = hub.end_livestream(v1, "room1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(drain(&mut rx_v1).is_empty());

        // Still joinable
        let (v2, _) = connect(&hub).await;
        hub.join_live_room(v2, "room1").await.unwrap();
    }

    #[tokio::test]
    async fn test_room_collision_notifies_displaced_members() {
        let hub = Hub::new();
        let (h1, mut rx_h1) = connect(&hub).await;
        let (v1, mut rx_v1) = connect(&hub).await;
        let (h2, _rx_h2) = connect(&hub).await;

        hub.create_live_room(h1, "room1").await;
        hub.join_live_room(v1, "room1").await.unwrap();
        drain(&mut rx_v1);

        hub.create_live_room(h2, "room1").await;

        let expected = ServerEvent::HostLeft {
            room_id: "room1".into(),
        };
        assert!(drain(&mut rx_h1).contains(&expected));
        assert!(drain(&mut rx_v1).contains(&expected));
    }

    #[tokio::test]
    async fn test_host_signal_reaches_viewers_only() {
        let hub = Hub::new();
        let (h, mut rx_h) = connect(&hub).await;
        let (v1, mut rx_v1) = connect(&hub).await;

        hub.create_live_room(h, "room1").await;
        hub.join_live_room(v1, "room1").await.unwrap();
        drain(&mut rx_h);
        drain(&mut rx_v1);

        let payload = serde_json::json!({"sdp": "offer"});
        hub.host_signal(h, "room1", payload.clone()).await.unwrap();

        assert_eq!(
            drain(&mut rx_v1),
            vec![ServerEvent::ReceiveHostSignal {
                signal_data: payload
            }]
        );
        assert!(drain(&mut rx_h).is_empty());

        // Viewer cannot impersonate the host
        let err = hub
            .host_signal(v1, "room1", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_viewer_signal_reaches_host_with_viewer_id() {
        let hub = Hub::new();
        let (h, mut rx_h) = connect(&hub).await;
        let (v1, _rx_v1) = connect(&hub).await;

        hub.create_live_room(h, "room1").await;
        hub.join_live_room(v1, "room1").await.unwrap();
        drain(&mut rx_h);

        let payload = serde_json::json!({"sdp": "answer"});
        hub.viewer_signal(v1, "room1", payload.clone())
            .await
            .unwrap();

        assert_eq!(
            drain(&mut rx_h),
            vec![ServerEvent::ViewerSignal {
                signal: payload,
                viewer_id: v1
            }]
        );
    }

    #[tokio::test]
    async fn test_disconnect_sweep_completeness() {
        let hub = Hub::new();
        // X hosts room A, views room B, and belongs to group C
        let (x, _rx_x) = connect(&hub).await;
        let (a_viewer, mut rx_av) = connect(&hub).await;
        let (b_host, mut rx_bh) = connect(&hub).await;
        let (c_member, mut rx_cm) = connect(&hub).await;

        hub.create_live_room(x, "a").await;
        hub.join_live_room(a_viewer, "a").await.unwrap();
        hub.create_live_room(b_host, "b").await;
        hub.join_live_room(x, "b").await.unwrap();
        hub.join_group(x, "c", "x@example.com").await;
        hub.join_group(c_member, "c", "cm@example.com").await;
        hub.login(x, "x@example.com").await;

        drain(&mut rx_av);
        drain(&mut rx_bh);
        drain(&mut rx_cm);

        hub.disconnect(x).await;

        // Room A deleted, hostLeft delivered to its viewer
        assert!(drain(&mut rx_av).contains(&ServerEvent::HostLeft {
            room_id: "a".into()
        }));
        assert_eq!(hub.join_live_room(a_viewer, "a").await.unwrap_err().kind(), ErrorKind::NotFound);

        // Room B viewer count decremented by exactly one
        assert!(drain(&mut rx_bh).contains(&ServerEvent::ViewerCount {
            room_id: "b".into(),
            count: 0
        }));

        // Group C no longer contains X, remaining member notified
        let c_events = drain(&mut rx_cm);
        assert!(c_events.iter().any(|e| matches!(
            e,
            ServerEvent::ViewerLeft { group_id, viewer_id, count: 1 }
                if group_id == "c" && *viewer_id == x
        )));
        // Presence entry swept too
        assert!(c_events.contains(&ServerEvent::UserDisconnected {
            user_id: "x@example.com".into()
        }));
        assert!(!hub.is_online("x@example.com").await);
    }

    #[tokio::test]
    async fn test_group_broadcast_includes_sender_connection() {
        let hub = Hub::new();
        let (m1, mut rx_m1) = connect(&hub).await;
        let (m2, mut rx_m2) = connect(&hub).await;

        hub.join_group(m1, "g1", "m1@example.com").await;
        hub.join_group(m2, "g1", "m2@example.com").await;
        drain(&mut rx_m1);
        drain(&mut rx_m2);

        let event = ServerEvent::GroupMessage {
            group_id: "g1".into(),
            message: "hello".into(),
            sender_identity: "m1@example.com".into(),
            timestamp: 1,
        };
        let receivers = hub.group_broadcast("g1", event.clone()).await;

        assert_eq!(receivers, 2);
        assert_eq!(drain(&mut rx_m1), vec![event.clone()]);
        assert_eq!(drain(&mut rx_m2), vec![event]);
    }

    #[tokio::test]
    async fn test_leave_group_stops_delivery() {
        let hub = Hub::new();
        let (m1, _rx_m1) = connect(&hub).await;
        let (m2, mut rx_m2) = connect(&hub).await;

        hub.join_group(m1, "g1", "m1@example.com").await;
        hub.join_group(m2, "g1", "m2@example.com").await;
        hub.leave_group(m2, "g1").await;
        drain(&mut rx_m2);

        hub.group_broadcast(
            "g1",
            ServerEvent::GroupMessage {
                group_id: "g1".into(),
                message: "after leave".into(),
                sender_identity: "m1@example.com".into(),
                timestamp: 2,
            },
        )
        .await;

        assert!(drain(&mut rx_m2).is_empty());
    }

    #[tokio::test]
    async fn test_notify_user_online_and_offline() {
        let hub = Hub::new();
        let (a, mut rx_a) = connect(&hub).await;
        hub.login(a, "ana@example.com").await;

        let payload = NotificationPayload {
            kind: "like_post".into(),
            sender: NotificationSender {
                id: "u42".into(),
                username: "bo".into(),
                avatar: None,
            },
            message_note: "bo liked your post".into(),
            link_click: "/post/99".into(),
            post_id: Some("99".into()),
            timestamp: 123,
        };

        assert!(hub.notify_user("ana@example.com", payload.clone()).await);
        assert_eq!(
            drain(&mut rx_a),
            vec![ServerEvent::Notification(payload.clone())]
        );

        assert!(!hub.notify_user("ghost@example.com", payload).await);
    }

    #[tokio::test]
    async fn test_stats_counters() {
        let hub = Hub::new();
        let (a, _rx_a) = connect(&hub).await;
        let (b, _rx_b) = connect(&hub).await;

        hub.login(a, "ana@example.com").await;
        hub.create_live_room(a, "room1").await;
        hub.join_group(b, "g1", "bo@example.com").await;

        let stats = hub.stats().await;
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.online_users, 1);
        assert_eq!(stats.live_rooms, 1);
        assert_eq!(stats.group_rooms, 1);
    }
}
