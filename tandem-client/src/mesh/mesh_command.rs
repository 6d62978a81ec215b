use tandem_core::PeerId;
use tokio::sync::oneshot;

use crate::mesh::PeerState;

pub enum MeshCommand {
    Leave {
        done: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<(PeerId, PeerState)>>,
    },
}
