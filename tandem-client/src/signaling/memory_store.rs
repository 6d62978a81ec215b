use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tandem_core::RoomId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::signaling::{ChangeKind, DocumentChange, SignalingStore, SignalingSubscription};

#[derive(Default)]
struct RoomDocuments {
    docs: HashMap<String, Value>,
    subscribers: Vec<mpsc::UnboundedSender<DocumentChange>>,
}

impl RoomDocuments {
    fn notify(&mut self, change: DocumentChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

/// In-process signaling store with the same merge and notification semantics
/// as the hosted document store.
#[derive(Default)]
pub struct MemorySignalingStore {
    rooms: DashMap<RoomId, RoomDocuments>,
    fail_subscriptions: AtomicBool,
}

impl MemorySignalingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `subscribe` call fail.
    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    pub fn document(&self, room_id: &RoomId, key: &str) -> Option<Value> {
        self.rooms
            .get(room_id)
            .and_then(|room| room.docs.get(key).cloned())
    }

    pub fn keys(&self, room_id: &RoomId) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|room| room.docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.subscribers.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or_default()
    }
}

fn merge(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(fields)) => {
            for (field, value) in fields {
                current.insert(field, value);
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

#[async_trait]
impl SignalingStore for MemorySignalingStore {
    async fn upsert(&self, room_id: &RoomId, key: &str, data: Value) -> Result<()> {
        let mut room = self.rooms.entry(room_id.clone()).or_default();

        let kind = match room.docs.get_mut(key) {
            Some(existing) => {
                merge(existing, data);
                ChangeKind::Modified
            }
            None => {
                room.docs.insert(key.to_owned(), data);
                ChangeKind::Added
            }
        };
        let data = room.docs.get(key).cloned();

        room.notify(DocumentChange {
            kind,
            key: key.to_owned(),
            data,
        });
        Ok(())
    }

    async fn delete(&self, room_id: &RoomId, key: &str) -> Result<()> {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return Ok(());
        };
        if room.docs.remove(key).is_some() {
            room.notify(DocumentChange {
                kind: ChangeKind::Removed,
                key: key.to_owned(),
                data: None,
            });
        }
        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<SignalingSubscription> {
        if self.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(Error::store("subscription rejected"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut room = self.rooms.entry(room_id.clone()).or_default();

        for (key, data) in room.docs.iter() {
            let _ = tx.send(DocumentChange {
                kind: ChangeKind::Added,
                key: key.clone(),
                data: Some(data.clone()),
            });
        }
        room.subscribers.push(tx);
        debug!("New subscriber for room {}", room_id);

        Ok(SignalingSubscription::new(rx))
    }
}
