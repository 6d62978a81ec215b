use std::sync::Arc;

use dashmap::DashMap;
use tandem_core::PeerId;

use crate::media::RemoteStream;

/// Read access to the remote media of a mesh. Cheap to clone.
#[derive(Clone, Default)]
pub struct MeshContext {
    streams: Arc<DashMap<PeerId, RemoteStream>>,
}

impl MeshContext {
    pub(crate) fn new(streams: Arc<DashMap<PeerId, RemoteStream>>) -> Self {
        Self { streams }
    }

    /// `(peerId, stream)` pairs, ordered by peer id.
    pub fn remote_streams(&self) -> Vec<(PeerId, RemoteStream)> {
        let mut streams: Vec<_> = self
            .streams
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        streams.sort_by(|a, b| a.0.cmp(&b.0));
        streams
    }

    pub fn remote_stream(&self, peer_id: &PeerId) -> Option<RemoteStream> {
        self.streams.get(peer_id).map(|entry| entry.value().clone())
    }

    pub fn list_peers(&self) -> Vec<PeerId> {
        self.streams.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn contains_peer(&self, peer_id: &PeerId) -> bool {
        self.streams.contains_key(peer_id)
    }
}
