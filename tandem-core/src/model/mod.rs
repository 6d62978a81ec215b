mod media;
mod peer;
mod playback;
mod room;
mod signaling;

pub use media::TrackKind;
pub use peer::{PeerId, SessionId};
pub use playback::{PlaybackState, truncate_to_tenth};
pub use room::RoomId;
pub use signaling::{
    CandidateEntry, IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalingRecord,
};
