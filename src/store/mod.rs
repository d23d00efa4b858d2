//! External record store seam
//!
//! Chat history persistence is delegated to an external collaborator behind
//! [`MessageStore`]. The relay never awaits a store write before broadcasting:
//! persistence is eventually consistent and may lag live delivery, and a
//! failed write is not rolled back (the message stays visible in the live
//! conversation but may be absent from later history queries).

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::protocol::{GroupId, UserId};

/// Failure reported by the record store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record store error: {0}")]
pub struct StoreError(pub String);

/// A persisted 1:1 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalRecord {
    pub sender_id: UserId,
    pub target_user_id: UserId,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// A persisted group message (room-scoped append)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub group_id: GroupId,
    pub sender_identity: UserId,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Durable message storage, addressed by opaque identifiers
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a personal message to the conversation history
    async fn save_personal(&self, record: PersonalRecord) -> Result<(), StoreError>;

    /// Append a group message to the room's history
    async fn save_group(&self, record: GroupRecord) -> Result<(), StoreError>;
}

/// Store that drops everything; for deployments where history is handled
/// elsewhere, and for demos
#[derive(Debug, Default)]
pub struct NullStore;

#[async_trait]
impl MessageStore for NullStore {
    async fn save_personal(&self, _record: PersonalRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_group(&self, _record: GroupRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory store, mainly for tests and demos
#[derive(Debug, Default)]
pub struct MemoryStore {
    personal: Mutex<Vec<PersonalRecord>>,
    group: Mutex<Vec<GroupRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of persisted personal messages
    pub async fn personal_records(&self) -> Vec<PersonalRecord> {
        self.personal.lock().await.clone()
    }

    /// Snapshot of persisted group messages
    pub async fn group_records(&self) -> Vec<GroupRecord> {
        self.group.lock().await.clone()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn save_personal(&self, record: PersonalRecord) -> Result<(), StoreError> {
        self.personal.lock().await.push(record);
        Ok(())
    }

    async fn save_group(&self, record: GroupRecord) -> Result<(), StoreError> {
        self.group.lock().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_appends_in_order() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();

            for n in 0..3 {
                store
                    .save_personal(PersonalRecord {
                        sender_id: "ana@example.com".into(),
                        target_user_id: "bo@example.com".into(),
                        message: format!("msg {n}"),
                        timestamp: n,
                    })
                    .await
                    .unwrap();
            }

            let records = store.personal_records().await;
            assert_eq!(records.len(), 3);
            assert_eq!(records[2].message, "msg 2");
        });
    }

    #[test]
    fn test_null_store_accepts_everything() {
        tokio_test::block_on(async {
            let store = NullStore;
            store
                .save_group(GroupRecord {
                    group_id: "g1".into(),
                    sender_identity: "ana@example.com".into(),
                    message: "dropped".into(),
                    timestamp: 0,
                })
                .await
                .unwrap();
        });
    }
}
