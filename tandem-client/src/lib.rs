pub mod clock;
pub mod config;
pub mod error;
pub mod media;
pub mod mesh;
pub mod playback;
pub mod session;
pub mod signaling;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, MediaConstraints};
pub use error::{Error, Result};
pub use media::{
    CaptureDevice, LocalTrack, LocalTracks, MediaCaptureManager, RemoteStream, RemoteTrack,
    SyntheticCapture, spawn_sample_pump,
};
pub use mesh::{
    CandidateQueue, InvalidTransition, MeshCommand, MeshContext, MeshHandle, MeshObserver,
    PeerConnectionEntry, PeerMesh, PeerState,
};
pub use playback::{
    IgnoreReason, LocalDecision, LocalPlayer, MemoryPlaybackStore, PlaybackHandle,
    PlaybackStore, PlaybackSyncEngine, PlayerSnapshot, PlayerUpdate, SyncConfig, SyncOutcome,
    SyncState,
};
pub use session::CallSession;
pub use signaling::{
    ChangeKind, DocumentChange, MemorySignalingStore, SignalingClient, SignalingEvent,
    SignalingStore, SignalingSubscription,
};
pub use transport::{
    ConnectionId, ConnectionWrapper, PeerTransport, TransportConfig, TransportEvent,
    TransportFactory, TransportState, WebRtcTransportFactory,
};
