use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tandem_core::{IceCandidate, PeerId, RoomId, SessionDescription, SessionId, SignalingRecord};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::signaling::{ChangeKind, DocumentChange, SignalingStore, SignalingSubscription};

/// A signaling change of another participant's record.
#[derive(Debug, Clone)]
pub enum SignalingEvent {
    /// The participant's record appeared.
    PeerDiscovered(SignalingRecord),
    RecordChanged(SignalingRecord),
    /// The participant's record disappeared.
    PeerRemoved(PeerId),
}

impl SignalingEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            SignalingEvent::PeerDiscovered(record) | SignalingEvent::RecordChanged(record) => {
                &record.user_id
            }
            SignalingEvent::PeerRemoved(peer_id) => peer_id,
        }
    }
}

/// Publishes this participant's signaling record and reads everyone else's.
///
/// The client owns the only copy of its record that it ever writes. Once
/// `leave` has started every publish is a no-op, so a negotiation step that
/// completes late cannot recreate the record. Each client is one session:
/// a participant that joins again does so through a new client.
pub struct SignalingClient {
    store: Arc<dyn SignalingStore>,
    clock: Arc<dyn Clock>,
    room_id: RoomId,
    self_id: PeerId,
    session_id: SessionId,
    record: Mutex<SignalingRecord>,
    closed: AtomicBool,
}

impl SignalingClient {
    pub fn new(
        store: Arc<dyn SignalingStore>,
        clock: Arc<dyn Clock>,
        room_id: RoomId,
        self_id: PeerId,
    ) -> Self {
        let session_id = SessionId::random();
        let record =
            SignalingRecord::presence(self_id.clone(), session_id.clone(), clock.now_ms());
        Self {
            store,
            clock,
            room_id,
            self_id,
            session_id,
            record: Mutex::new(record),
            closed: AtomicBool::new(false),
        }
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Publishes presence, then subscribes to the room.
    ///
    /// When the subscription cannot be opened the presence record is removed
    /// again and the error returned.
    pub async fn join(&self) -> Result<SignalingSubscription> {
        {
            let mut record = self.record.lock().await;
            *record = SignalingRecord::presence(
                self.self_id.clone(),
                self.session_id.clone(),
                self.clock.now_ms(),
            );
            self.write(&record).await?;
        }
        info!("Published presence for {:?} in room {}", self.self_id, self.room_id);

        match self.subscribe().await {
            Ok(subscription) => Ok(subscription),
            Err(e) => {
                warn!("Subscription to room {} failed: {}", self.room_id, e);
                let _ = self.store.delete(&self.room_id, self.self_id.as_str()).await;
                Err(e)
            }
        }
    }

    pub async fn subscribe(&self) -> Result<SignalingSubscription> {
        self.store.subscribe(&self.room_id).await
    }

    pub async fn publish_offer(
        &self,
        target: &PeerId,
        target_session: &SessionId,
        offer: SessionDescription,
    ) -> Result<()> {
        let mut record = self.record.lock().await;
        if self.is_closed() {
            return Ok(());
        }
        record.set_offer(
            target.clone(),
            target_session.clone(),
            offer,
            self.clock.now_ms(),
        );
        debug!("Publishing offer to {:?}", target);
        self.write(&record).await
    }

    pub async fn publish_answer(
        &self,
        target: &PeerId,
        target_session: &SessionId,
        answer: SessionDescription,
    ) -> Result<()> {
        let mut record = self.record.lock().await;
        if self.is_closed() {
            return Ok(());
        }
        record.set_answer(
            target.clone(),
            target_session.clone(),
            answer,
            self.clock.now_ms(),
        );
        debug!("Publishing answer to {:?}", target);
        self.write(&record).await
    }

    pub async fn publish_candidate(
        &self,
        target: &PeerId,
        target_session: &SessionId,
        candidate: IceCandidate,
    ) -> Result<()> {
        let mut record = self.record.lock().await;
        if self.is_closed() {
            return Ok(());
        }
        record.push_candidate(
            target.clone(),
            target_session.clone(),
            candidate,
            self.clock.now_ms(),
        );
        self.write(&record).await
    }

    /// Removes the description and candidates addressed to a peer that is
    /// gone. Writes only when the record held something for it.
    pub async fn forget(&self, peer_id: &PeerId) -> Result<()> {
        let mut record = self.record.lock().await;
        if self.is_closed() || !record.forget(peer_id, self.clock.now_ms()) {
            return Ok(());
        }
        debug!("Cleared signaling addressed to {:?}", peer_id);
        self.write(&record).await
    }

    /// Deletes the own record. Only the first call does anything.
    pub async fn leave(&self) -> Result<()> {
        let _record = self.record.lock().await;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.delete(&self.room_id, self.self_id.as_str()).await?;
        info!("Removed signaling record of {:?}", self.self_id);
        Ok(())
    }

    /// Turns a raw store change into an event about another participant.
    ///
    /// Changes to the own record yield `None`. A body that is not a valid
    /// signaling record yields `SignalingParse`.
    pub fn parse_change(&self, change: DocumentChange) -> Result<Option<SignalingEvent>> {
        if change.key == self.self_id.as_str() {
            return Ok(None);
        }
        let peer_id = PeerId::from(change.key.as_str());

        let parse = |data: Option<serde_json::Value>| -> Result<Option<SignalingRecord>> {
            let Some(data) = data else {
                return Ok(None);
            };
            let record: SignalingRecord =
                serde_json::from_value(data).map_err(|source| Error::SignalingParse {
                    peer_id: peer_id.clone(),
                    source,
                })?;
            if record.user_id == self.self_id {
                return Ok(None);
            }
            Ok(Some(record))
        };

        let event = match change.kind {
            ChangeKind::Added => parse(change.data)?.map(SignalingEvent::PeerDiscovered),
            ChangeKind::Modified => parse(change.data)?.map(SignalingEvent::RecordChanged),
            ChangeKind::Removed => Some(SignalingEvent::PeerRemoved(peer_id.clone())),
        };
        Ok(event)
    }

    async fn write(&self, record: &SignalingRecord) -> Result<()> {
        let data = serde_json::to_value(record).map_err(Error::store)?;
        self.store
            .upsert(&self.room_id, self.self_id.as_str(), data)
            .await
    }
}
