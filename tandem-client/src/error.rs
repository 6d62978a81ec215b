use tandem_core::{PeerId, TrackKind};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user refused access to a capture device. Retryable by connecting again.
    #[error("media access denied: {0}")]
    PermissionDenied(String),

    #[error("no {0} capture device available")]
    DeviceUnavailable(TrackKind),

    #[error("malformed signaling record from {peer_id}: {source}")]
    SignalingParse {
        peer_id: PeerId,
        #[source]
        source: serde_json::Error,
    },

    /// A single peer connection failed. Never affects other peers.
    #[error("transport failure for peer {peer_id}: {reason}")]
    TransportFailure { peer_id: PeerId, reason: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("session already closed")]
    AlreadyClosed,
}

impl Error {
    pub fn transport(peer_id: &PeerId, err: impl std::fmt::Display) -> Self {
        Self::TransportFailure {
            peer_id: peer_id.clone(),
            reason: err.to_string(),
        }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}
