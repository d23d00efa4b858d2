//! Peer-to-peer call signaling relay
//!
//! Calls are addressed by connection id (resolved beforehand through the
//! presence directory), not by user id. Payloads pass through byte-for-byte;
//! the server never parses SDP or ICE. A missing target means the peer is
//! gone and the caller gets a `not_found` error event.

use serde_json::Value;

use crate::hub::Hub;
use crate::protocol::{ConnId, ErrorKind, MediaActive, MediaKind, ServerEvent};

/// Forward a call offer to the target connection
///
/// The offer carries the caller's user identity so the callee can render the
/// incoming-call UI before answering.
pub async fn initiate(
    hub: &Hub,
    caller: ConnId,
    target_id: ConnId,
    signal_data: Value,
    sender_id: String,
    sender_name: String,
) {
    let delivered = hub
        .send_to(
            target_id,
            ServerEvent::IncomingCall {
                signal: signal_data,
                from: sender_id,
                name: sender_name,
            },
        )
        .await;

    if !delivered {
        tracing::debug!(caller = %caller, target = %target_id, "Call target gone");
        hub.send_to(
            caller,
            ServerEvent::error(ErrorKind::NotFound, "Call target is not connected"),
        )
        .await;
    }
}

/// Forward a call answer back to the original caller
///
/// If the answer carries a media status, it is additionally fanned out to all
/// other connections as `mediaStatusChanged`.
pub async fn answer(
    hub: &Hub,
    answerer: ConnId,
    target_id: ConnId,
    signal_data: Value,
    media_type: Option<MediaKind>,
    media_status: Option<MediaActive>,
) {
    let delivered = hub
        .send_to(
            target_id,
            ServerEvent::CallAnswered {
                signal: signal_data,
                media_type,
                media_status,
            },
        )
        .await;

    if !delivered {
        tracing::debug!(answerer = %answerer, target = %target_id, "Answer target gone");
        hub.send_to(
            answerer,
            ServerEvent::error(ErrorKind::NotFound, "Call peer is not connected"),
        )
        .await;
        return;
    }

    if let (Some(media_type), Some(is_active)) = (media_type, media_status) {
        hub.broadcast_except(
            answerer,
            ServerEvent::MediaStatusChanged {
                media_type,
                is_active,
            },
        )
        .await;
    }
}

/// Forward an in-call text message to the peer connection
///
/// These ride the call channel and bypass the chat relay entirely: no
/// presence lookup, no persistence.
pub async fn call_message(
    hub: &Hub,
    sender: ConnId,
    target_id: ConnId,
    message: String,
    sender_name: String,
) {
    let delivered = hub
        .send_to(
            target_id,
            ServerEvent::ReceiveMessage {
                message,
                sender_name,
            },
        )
        .await;

    if !delivered {
        tracing::debug!(sender = %sender, target = %target_id, "Call message target gone");
        hub.send_to(
            sender,
            ServerEvent::error(ErrorKind::NotFound, "Call peer is not connected"),
        )
        .await;
    }
}

/// Forward a hang-up to the peer connection
pub async fn terminate(hub: &Hub, caller: ConnId, target_id: ConnId) {
    let delivered = hub.send_to(target_id, ServerEvent::CallTerminated).await;
    if !delivered {
        // Peer already gone; hanging up on a dead connection is not an error
        tracing::debug!(caller = %caller, target = %target_id, "Terminate target already gone");
    }
}

/// Broadcast a camera/microphone toggle to every other connection
pub async fn media_status(hub: &Hub, sender: ConnId, media_type: MediaKind, is_active: MediaActive) {
    hub.broadcast_except(
        sender,
        ServerEvent::MediaStatusChanged {
            media_type,
            is_active,
        },
    )
    .await;
}
