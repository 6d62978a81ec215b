use async_trait::async_trait;
use tandem_core::{IceCandidate, PeerId, SessionDescription};
use tokio::sync::mpsc;

use crate::media::LocalTracks;
use crate::transport::{ConnectionId, TransportEvent};

/// One negotiated connection to one remote participant.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    fn connection_id(&self) -> ConnectionId;

    async fn add_local_tracks(&self, tracks: &LocalTracks) -> anyhow::Result<()>;

    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    /// Applies a remote offer and returns the local answer.
    async fn accept_offer(&self, offer: &SessionDescription) -> anyhow::Result<SessionDescription>;

    async fn accept_answer(&self, answer: &SessionDescription) -> anyhow::Result<()>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Builds transports. Events of the created transport are sent on `event_tx`.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(
        &self,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Box<dyn PeerTransport>>;
}
