use std::fmt;

use tandem_core::{IceCandidate, PeerId};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

use crate::media::RemoteTrack;

/// Generation number of one transport. A peer that is torn down and later
/// reconnected gets a new id, so late events of the old transport can be told
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl TransportState {
    /// Disconnected, failed and closed all end the connection.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransportState::Disconnected | TransportState::Failed | TransportState::Closed
        )
    }
}

impl From<RTCPeerConnectionState> for TransportState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                TransportState::New
            }
            RTCPeerConnectionState::Connecting => TransportState::Connecting,
            RTCPeerConnectionState::Connected => TransportState::Connected,
            RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
            RTCPeerConnectionState::Failed => TransportState::Failed,
            RTCPeerConnectionState::Closed => TransportState::Closed,
        }
    }
}

/// Events a transport pushes into the mesh loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    StateChanged(PeerId, ConnectionId, TransportState),
    CandidateGenerated(PeerId, ConnectionId, IceCandidate),
    RemoteTrack(PeerId, ConnectionId, RemoteTrack),
}

impl TransportEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            TransportEvent::StateChanged(peer_id, _, _)
            | TransportEvent::CandidateGenerated(peer_id, _, _)
            | TransportEvent::RemoteTrack(peer_id, _, _) => peer_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::StateChanged(_, id, _)
            | TransportEvent::CandidateGenerated(_, id, _)
            | TransportEvent::RemoteTrack(_, id, _) => *id,
        }
    }
}
