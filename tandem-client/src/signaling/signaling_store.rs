use async_trait::async_trait;
use serde_json::Value;
use tandem_core::RoomId;
use tokio::sync::mpsc;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One change notification from a room-scoped document subscription.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    /// Document key inside the room; the owning participant's id.
    pub key: String,
    /// Document body after the change; `None` for removals.
    pub data: Option<Value>,
}

/// Document store the signaling records live in (external collaborator).
///
/// Documents are keyed by `(room, key)`. Writes merge top-level fields into
/// the existing document; subscribers first receive every existing document as
/// `Added`, then live changes, with no ordering guarantee across keys.
#[async_trait]
pub trait SignalingStore: Send + Sync + 'static {
    async fn upsert(&self, room_id: &RoomId, key: &str, data: Value) -> Result<()>;

    async fn delete(&self, room_id: &RoomId, key: &str) -> Result<()>;

    async fn subscribe(&self, room_id: &RoomId) -> Result<SignalingSubscription>;
}

/// Live change feed for one room. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SignalingSubscription {
    rx: mpsc::UnboundedReceiver<DocumentChange>,
}

impl SignalingSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<DocumentChange>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<DocumentChange> {
        self.rx.recv().await
    }

    pub fn close(mut self) {
        self.rx.close();
    }
}
