use std::sync::Arc;

use async_trait::async_trait;
use tandem_client::{MeshContext, MeshObserver, RemoteStream};
use tandem_core::PeerId;
use tokio::sync::Mutex;

/// Event types recorded by TestMeshObserver.
#[derive(Debug, Clone)]
pub enum MeshEvent {
    RemoteStream { peer_id: PeerId, tracks: usize },
    Disconnected { peer_id: PeerId },
}

/// A MeshObserver that records every callback.
#[derive(Clone, Default)]
pub struct TestMeshObserver {
    events: Arc<Mutex<Vec<MeshEvent>>>,
}

impl TestMeshObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_events(&self) -> Vec<MeshEvent> {
        self.events.lock().await.clone()
    }

    /// Polls until `predicate` holds for the recorded events.
    pub async fn wait_until<F>(&self, timeout_ms: u64, predicate: F) -> bool
    where
        F: Fn(&[MeshEvent]) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if predicate(&self.events.lock().await) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn wait_for_disconnect(&self, peer_id: &PeerId, timeout_ms: u64) -> bool {
        self.wait_until(timeout_ms, |events| {
            events
                .iter()
                .any(|e| matches!(e, MeshEvent::Disconnected { peer_id: id } if id == peer_id))
        })
        .await
    }

    pub async fn has_disconnect(&self, peer_id: &PeerId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, MeshEvent::Disconnected { peer_id: id } if id == peer_id))
    }

    /// Track counts of every stream announced for `peer_id`, in order.
    pub async fn streams_from(&self, peer_id: &PeerId) -> Vec<usize> {
        self.get_events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                MeshEvent::RemoteStream { peer_id: id, tracks } if &id == peer_id => Some(tracks),
                _ => None,
            })
            .collect()
    }

    pub async fn disconnect_count(&self) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, MeshEvent::Disconnected { .. }))
            .count()
    }
}

#[async_trait]
impl MeshObserver for TestMeshObserver {
    async fn on_remote_stream(&self, _ctx: &MeshContext, peer_id: PeerId, stream: RemoteStream) {
        self.events.lock().await.push(MeshEvent::RemoteStream {
            peer_id,
            tracks: stream.tracks.len(),
        });
    }

    async fn on_peer_disconnected(&self, _ctx: &MeshContext, peer_id: PeerId) {
        self.events
            .lock()
            .await
            .push(MeshEvent::Disconnected { peer_id });
    }
}
