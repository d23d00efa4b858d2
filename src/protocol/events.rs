//! Event payload definitions
//!
//! [`ClientEvent`] covers every intent a client may send; [`ServerEvent`]
//! covers everything the server emits. Signaling payloads (SDP offers,
//! answers, ICE candidates) are opaque to the server and carried as raw
//! `serde_json::Value` — the server's only contract is delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConnId, GroupId, RoomId, UserId};

/// Media kinds a call participant can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Both,
}

/// Media activity flag: a single boolean, or an `[audio, video]` pair when
/// the kind is `both`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaActive {
    One(bool),
    Pair([bool; 2]),
}

/// Tagged error category reported to the initiating connection
///
/// One explicit policy for every precondition failure: nothing fails silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Target user offline, room missing, or peer connection gone
    NotFound,
    /// Caller is not permitted to perform the operation (e.g. non-host end)
    Forbidden,
    /// Malformed payload or operation invalid in the current session phase
    InvalidState,
}

/// Identity attached to a server-pushed notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSender {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Payload of a `notification` event pushed to a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: NotificationSender,
    pub message_note: String,
    pub link_click: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    /// Milliseconds since the Unix epoch, stamped at emit time
    pub timestamp: u64,
}

/// Intents a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Bind this connection to a user identity and enter the presence
    /// directory. A later login for the same user overwrites the earlier
    /// presence entry (single active session per user).
    #[serde(rename_all = "camelCase")]
    Login { user_id: UserId },

    /// Remove the user's presence entry. No-op if absent.
    #[serde(rename_all = "camelCase")]
    Logout { user_id: UserId },

    /// Query: is this user currently online? Answered with a same-named
    /// server event.
    #[serde(rename_all = "camelCase")]
    IsUserOnline { user_id: UserId },

    /// Query: resolve a user's live connection id, or null if offline.
    #[serde(rename_all = "camelCase")]
    ResolveConnectionId { user_id: UserId },

    /// Idempotent group-room membership registration with lazy room creation
    #[serde(rename_all = "camelCase")]
    CreateOrJoinGroupRoom { group_id: GroupId, member_id: UserId },

    /// Leave a group room. No error if not a member.
    #[serde(rename_all = "camelCase")]
    LeaveGroupRoom { group_id: GroupId },

    /// 1:1 message, resolved through the presence directory
    #[serde(rename_all = "camelCase")]
    SendPersonalMessage { target_user_id: UserId, message: String },

    /// Message broadcast to every connection joined to the group room
    #[serde(rename_all = "camelCase")]
    SendGroupMessage {
        group_id: GroupId,
        message: String,
        sender_identity: UserId,
    },

    /// Host registers a new live-stream room under a host-chosen id
    #[serde(rename_all = "camelCase")]
    CreateLivestreamRoom { room_id: RoomId },

    /// Viewer joins an existing live-stream room
    #[serde(rename_all = "camelCase")]
    JoinLivestreamRoom { room_id: RoomId },

    /// Host forwards signal data to all viewers of its room
    #[serde(rename_all = "camelCase")]
    HostSignal { room_id: RoomId, signal_data: Value },

    /// Viewer forwards signal data back to the room's host
    #[serde(rename_all = "camelCase")]
    ViewerSignal { room_id: RoomId, signal: Value },

    /// Host terminates its live-stream room
    #[serde(rename_all = "camelCase")]
    EndLivestream { room_id: RoomId },

    /// Offer a call to a peer connection (target resolved beforehand via
    /// `resolveConnectionId`)
    #[serde(rename_all = "camelCase")]
    InitiateCall {
        target_id: ConnId,
        signal_data: Value,
        sender_id: UserId,
        sender_name: String,
    },

    /// Answer an incoming call; optionally carries the answerer's media
    /// status, which is fanned out as `mediaStatusChanged`
    #[serde(rename_all = "camelCase")]
    AnswerCall {
        target_id: ConnId,
        signal_data: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<MediaKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_status: Option<MediaActive>,
    },

    /// Hang up: forward a terminal event to the peer
    #[serde(rename_all = "camelCase")]
    TerminateCall { target_id: ConnId },

    /// In-call text message, addressed to the peer connection directly
    #[serde(rename_all = "camelCase")]
    SendMessage {
        target_id: ConnId,
        message: String,
        sender_name: String,
    },

    /// Toggle camera/microphone; fanned out to all other connections since
    /// the event carries no target
    #[serde(rename_all = "camelCase")]
    ChangeMediaStatus {
        media_type: MediaKind,
        is_active: MediaActive,
    },
}

/// Events the server emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Handshake: the connection's own identifier, sent immediately on accept
    #[serde(rename_all = "camelCase")]
    ConnectionId { connection_id: ConnId },

    /// A user entered the presence directory (sent to all other connections)
    #[serde(rename_all = "camelCase")]
    UserConnected { user_id: UserId },

    /// A user left the presence directory
    #[serde(rename_all = "camelCase")]
    UserDisconnected { user_id: UserId },

    /// Reply to the `isUserOnline` query
    #[serde(rename_all = "camelCase")]
    IsUserOnline { user_id: UserId, online: bool },

    /// Reply to the `resolveConnectionId` query
    #[serde(rename_all = "camelCase")]
    ResolveConnectionId {
        user_id: UserId,
        connection_id: Option<ConnId>,
    },

    /// 1:1 message delivery
    #[serde(rename_all = "camelCase")]
    PersonalMessage { sender_id: UserId, message: String },

    /// Group message fan-out (`timestamp` is milliseconds since Unix epoch)
    #[serde(rename_all = "camelCase")]
    GroupMessage {
        group_id: GroupId,
        message: String,
        sender_identity: UserId,
        timestamp: u64,
    },

    /// A member joined a group room
    #[serde(rename_all = "camelCase")]
    ViewerJoined {
        group_id: GroupId,
        viewer_id: ConnId,
        user_id: UserId,
        count: usize,
    },

    /// A member left a group room (explicitly or by disconnect)
    #[serde(rename_all = "camelCase")]
    ViewerLeft {
        group_id: GroupId,
        viewer_id: ConnId,
        count: usize,
    },

    /// Updated viewer count of a live-stream room
    #[serde(rename_all = "camelCase")]
    ViewerCount { room_id: RoomId, count: usize },

    /// Terminal event: the room's host ended the stream or disconnected
    #[serde(rename_all = "camelCase")]
    HostLeft { room_id: RoomId },

    /// Host signal data relayed to a viewer
    #[serde(rename_all = "camelCase")]
    ReceiveHostSignal { signal_data: Value },

    /// Viewer signal data relayed to the host
    #[serde(rename_all = "camelCase")]
    ViewerSignal { signal: Value, viewer_id: ConnId },

    /// Incoming call offer with the caller's identity
    #[serde(rename_all = "camelCase")]
    IncomingCall {
        signal: Value,
        from: UserId,
        name: String,
    },

    /// Call answer relayed back to the original caller
    #[serde(rename_all = "camelCase")]
    CallAnswered {
        signal: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<MediaKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_status: Option<MediaActive>,
    },

    /// The peer hung up
    CallTerminated,

    /// In-call text message from the peer
    #[serde(rename_all = "camelCase")]
    ReceiveMessage { message: String, sender_name: String },

    /// A peer toggled camera/microphone
    #[serde(rename_all = "camelCase")]
    MediaStatusChanged {
        media_type: MediaKind,
        is_active: MediaActive,
    },

    /// Server-pushed notification for the connection's user
    Notification(NotificationPayload),

    /// Precondition failure, reported only to the initiating connection
    #[serde(rename_all = "camelCase")]
    Error { kind: ErrorKind, message: String },
}

impl ServerEvent {
    /// Build an error event
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            kind,
            message: message.into(),
        }
    }
}
