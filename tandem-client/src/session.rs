use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tandem_core::{PeerId, RoomId, TrackKind};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::MediaConstraints;
use crate::error::Result;
use crate::media::{CaptureDevice, LocalTracks, MediaCaptureManager, RemoteStream};
use crate::mesh::{MeshHandle, MeshObserver, PeerMesh};
use crate::signaling::{SignalingClient, SignalingStore};
use crate::transport::TransportFactory;

enum SessionState {
    Idle,
    Connected {
        media: MediaCaptureManager,
        mesh: MeshHandle,
        task: JoinHandle<()>,
    },
}

/// The call of one participant in one room, as driven by the UI.
pub struct CallSession {
    room_id: RoomId,
    self_id: PeerId,
    constraints: MediaConstraints,
    signaling_store: Arc<dyn SignalingStore>,
    transport_factory: Arc<dyn TransportFactory>,
    capture_device: Arc<dyn CaptureDevice>,
    observer: Arc<dyn MeshObserver>,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
    // What the user asked for, kept across connects.
    audio_enabled: AtomicBool,
    video_enabled: AtomicBool,
}

impl CallSession {
    pub fn new(
        room_id: RoomId,
        self_id: PeerId,
        constraints: MediaConstraints,
        signaling_store: Arc<dyn SignalingStore>,
        transport_factory: Arc<dyn TransportFactory>,
        capture_device: Arc<dyn CaptureDevice>,
        observer: Arc<dyn MeshObserver>,
    ) -> Self {
        Self {
            room_id,
            self_id,
            constraints,
            signaling_store,
            transport_factory,
            capture_device,
            observer,
            clock: Arc::new(SystemClock),
            state: Mutex::new(SessionState::Idle),
            audio_enabled: AtomicBool::new(true),
            video_enabled: AtomicBool::new(true),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    /// Acquires media and joins the mesh. Does nothing when already
    /// connected. On failure everything acquired so far is released and the
    /// session stays disconnected, so `connect` can simply be retried.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if matches!(*state, SessionState::Connected { .. }) {
            debug!("{:?} already connected", self.self_id);
            return Ok(());
        }

        let mut media = MediaCaptureManager::new(self.capture_device.clone());
        let tracks = media.acquire_with(&self.constraints).await?;
        for kind in [TrackKind::Audio, TrackKind::Video] {
            if !self.wants(kind) {
                media.set_enabled(kind, false);
            }
        }

        let signaling = Arc::new(SignalingClient::new(
            self.signaling_store.clone(),
            self.clock.clone(),
            self.room_id.clone(),
            self.self_id.clone(),
        ));
        let (mut mesh, handle) = PeerMesh::new(
            signaling,
            self.transport_factory.clone(),
            self.observer.clone(),
            tracks,
        );

        if let Err(e) = mesh.join().await {
            warn!("Join of room {} failed: {}", self.room_id, e);
            media.release();
            return Err(e);
        }

        let task = tokio::spawn(mesh.run());
        *state = SessionState::Connected {
            media,
            mesh: handle,
            task,
        };
        info!("{:?} connected to room {}", self.self_id, self.room_id);
        Ok(())
    }

    /// Leaves the room and releases media. Safe to call at any time.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        let SessionState::Connected {
            mut media,
            mesh,
            task,
        } = std::mem::replace(&mut *state, SessionState::Idle)
        else {
            return;
        };

        if let Err(e) = mesh.leave().await {
            warn!("Leaving room {} failed: {}", self.room_id, e);
        }
        let _ = task.await;
        media.release();
        info!("{:?} disconnected from room {}", self.self_id, self.room_id);
    }

    /// Flips the microphone. Returns whether audio is now enabled. While
    /// disconnected the choice is applied on the next connect.
    pub async fn toggle_audio(&self) -> bool {
        self.toggle(TrackKind::Audio).await
    }

    /// Flips the camera. Returns whether video is now enabled.
    pub async fn toggle_video(&self) -> bool {
        self.toggle(TrackKind::Video).await
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.wants(TrackKind::Audio)
    }

    pub fn is_video_enabled(&self) -> bool {
        self.wants(TrackKind::Video)
    }

    fn desired(&self, kind: TrackKind) -> &AtomicBool {
        match kind {
            TrackKind::Audio => &self.audio_enabled,
            TrackKind::Video => &self.video_enabled,
        }
    }

    fn wants(&self, kind: TrackKind) -> bool {
        self.desired(kind).load(Ordering::SeqCst)
    }

    async fn toggle(&self, kind: TrackKind) -> bool {
        let state = self.state.lock().await;
        let tracks = match &*state {
            SessionState::Connected { media, .. } => media.tracks(),
            SessionState::Idle => None,
        };
        if tracks.is_some_and(|tracks| !tracks.has_kind(kind)) {
            return false;
        }

        let enabled = !self.wants(kind);
        self.desired(kind).store(enabled, Ordering::SeqCst);
        if let SessionState::Connected { media, .. } = &*state {
            media.set_enabled(kind, enabled);
        }
        enabled
    }

    pub async fn local_tracks(&self) -> Option<LocalTracks> {
        match &*self.state.lock().await {
            SessionState::Connected { media, .. } => media.tracks().cloned(),
            SessionState::Idle => None,
        }
    }

    pub async fn remote_peers(&self) -> Vec<(PeerId, RemoteStream)> {
        match &*self.state.lock().await {
            SessionState::Connected { mesh, .. } => mesh.remote_streams(),
            SessionState::Idle => Vec::new(),
        }
    }

    pub async fn mesh(&self) -> Option<MeshHandle> {
        match &*self.state.lock().await {
            SessionState::Connected { mesh, .. } => Some(mesh.clone()),
            SessionState::Idle => None,
        }
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Connected { .. })
    }
}
