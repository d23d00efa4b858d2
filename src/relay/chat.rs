//! Chat relays: live delivery first, persistence in the background
//!
//! Both relays broadcast before the store write is even spawned, so live
//! delivery never waits on storage. The spawned write's [`PersistHandle`]
//! resolves when the record is durable (or the write failed); callers that
//! care about durability can await it, the connection loop does not.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::unix_millis;
use crate::hub::Hub;
use crate::protocol::{ConnId, ServerEvent, UserId};
use crate::store::{GroupRecord, MessageStore, PersonalRecord, StoreError};

/// Completion signal of a background persistence write
pub type PersistHandle = JoinHandle<Result<(), StoreError>>;

/// Relay a 1:1 message: deliver to the target's live connection (if any) and
/// persist the record regardless of delivery
///
/// An offline target is not an error; the message still lands in history.
pub async fn relay_personal(
    hub: &Hub,
    store: Arc<dyn MessageStore>,
    sender_id: &str,
    target_user_id: &str,
    message: &str,
) -> PersistHandle {
    let delivered = hub
        .send_to_user(
            target_user_id,
            ServerEvent::PersonalMessage {
                sender_id: sender_id.to_string(),
                message: message.to_string(),
            },
        )
        .await;

    if !delivered {
        tracing::debug!(target = %target_user_id, "Personal message target offline, persisting only");
    }

    let record = PersonalRecord {
        sender_id: sender_id.to_string(),
        target_user_id: target_user_id.to_string(),
        message: message.to_string(),
        timestamp: unix_millis(),
    };

    tokio::spawn(async move {
        if let Err(err) = store.save_personal(record).await {
            tracing::error!(error = %err, "Personal message persistence failed");
            return Err(err);
        }
        Ok(())
    })
}

/// Relay a group message: fan out to the room's live members and persist
pub async fn relay_group(
    hub: &Hub,
    store: Arc<dyn MessageStore>,
    _sender: ConnId,
    group_id: &str,
    sender_identity: &UserId,
    message: &str,
) -> PersistHandle {
    let timestamp = unix_millis();

    let receivers = hub
        .group_broadcast(
            group_id,
            ServerEvent::GroupMessage {
                group_id: group_id.to_string(),
                message: message.to_string(),
                sender_identity: sender_identity.clone(),
                timestamp,
            },
        )
        .await;
    tracing::debug!(group = %group_id, receivers, "Group message broadcast");

    let record = GroupRecord {
        group_id: group_id.to_string(),
        sender_identity: sender_identity.clone(),
        message: message.to_string(),
        timestamp,
    };

    tokio::spawn(async move {
        if let Err(err) = store.save_group(record).await {
            tracing::error!(error = %err, "Group message persistence failed");
            return Err(err);
        }
        Ok(())
    })
}
