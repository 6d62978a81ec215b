use async_trait::async_trait;
use tandem_core::PeerId;

use crate::media::RemoteStream;
use crate::mesh::MeshContext;

/// UI-side receiver of mesh events.
#[async_trait]
pub trait MeshObserver: Send + Sync + 'static {
    /// A remote stream appeared or gained a track.
    async fn on_remote_stream(&self, ctx: &MeshContext, peer_id: PeerId, stream: RemoteStream);

    async fn on_peer_disconnected(&self, ctx: &MeshContext, peer_id: PeerId);
}
