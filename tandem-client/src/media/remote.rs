use std::sync::Arc;

use tandem_core::{PeerId, TrackKind};
use webrtc::track::track_remote::TrackRemote;

/// A track received from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub kind: TrackKind,
    pub id: String,
    pub stream_id: String,
    /// The underlying webrtc-rs track; absent for tracks produced by test transports.
    pub track: Option<Arc<TrackRemote>>,
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .finish()
    }
}

impl RemoteTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            stream_id: stream_id.into(),
            track: None,
        }
    }
}

/// All tracks received from one remote participant.
#[derive(Clone, Debug)]
pub struct RemoteStream {
    pub peer_id: PeerId,
    pub tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            tracks: Vec::new(),
        }
    }

    /// Adds a track unless one with the same id is already present.
    pub fn add_track(&mut self, track: RemoteTrack) -> bool {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}
