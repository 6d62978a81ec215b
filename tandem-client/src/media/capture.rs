use std::sync::Arc;

use async_trait::async_trait;
use tandem_core::TrackKind;
use tracing::{debug, info, warn};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::config::MediaConstraints;
use crate::error::Result;
use crate::media::{LocalTrack, LocalTracks};

/// Platform capture backend (camera, microphone, screen, synthetic source).
#[async_trait]
pub trait CaptureDevice: Send + Sync + 'static {
    /// Opens one track of `kind`.
    ///
    /// Fails with `PermissionDenied` when the user declines access and with
    /// `DeviceUnavailable` when no device of that kind exists.
    async fn open(&self, kind: TrackKind) -> Result<Arc<TrackLocalStaticSample>>;
}

/// Acquires and holds the local tracks of a call.
pub struct MediaCaptureManager {
    device: Arc<dyn CaptureDevice>,
    tracks: Option<LocalTracks>,
}

impl MediaCaptureManager {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            tracks: None,
        }
    }

    /// Acquires the wanted tracks. Acquisition is all-or-nothing: when one
    /// kind fails, tracks already opened are stopped and the error returned.
    pub async fn acquire(&mut self, want_audio: bool, want_video: bool) -> Result<LocalTracks> {
        if let Some(tracks) = &self.tracks {
            debug!("Local media already acquired ({} tracks)", tracks.len());
            return Ok(tracks.clone());
        }

        let mut opened = Vec::new();
        let wanted = [(TrackKind::Audio, want_audio), (TrackKind::Video, want_video)];
        for (kind, wanted) in wanted {
            if !wanted {
                continue;
            }
            match self.device.open(kind).await {
                Ok(track) => opened.push(LocalTrack::new(kind, track)),
                Err(e) => {
                    warn!("Failed to acquire {} track: {}", kind, e);
                    LocalTracks::new(opened).stop_all();
                    return Err(e);
                }
            }
        }

        let tracks = LocalTracks::new(opened);
        info!(
            "Acquired local media: audio={} video={}",
            tracks.has_kind(TrackKind::Audio),
            tracks.has_kind(TrackKind::Video)
        );
        self.tracks = Some(tracks.clone());
        Ok(tracks)
    }

    pub async fn acquire_with(&mut self, constraints: &MediaConstraints) -> Result<LocalTracks> {
        self.acquire(constraints.audio, constraints.video).await
    }

    /// Toggles every held track of `kind`. No-op before acquisition.
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        if let Some(tracks) = &self.tracks {
            tracks.set_enabled(kind, enabled);
            info!("{} {}", kind, if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn tracks(&self) -> Option<&LocalTracks> {
        self.tracks.as_ref()
    }

    pub fn is_acquired(&self) -> bool {
        self.tracks.is_some()
    }

    /// Stops all tracks. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(tracks) = self.tracks.take() {
            tracks.stop_all();
            info!("Released local media ({} tracks)", tracks.len());
        }
    }
}

impl Drop for MediaCaptureManager {
    fn drop(&mut self) {
        self.release();
    }
}
