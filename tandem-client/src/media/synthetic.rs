use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tandem_core::TrackKind;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::error::{Error, Result};
use crate::media::{CaptureDevice, LocalTracks};

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(100);
const OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];

/// Capture device producing opus / VP8 static-sample tracks without hardware.
///
/// Used by the simulator and tests; permission refusal and missing devices
/// can be configured.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    stream_id: String,
    deny: bool,
    missing: HashSet<TrackKind>,
}

impl SyntheticCapture {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            deny: false,
            missing: HashSet::new(),
        }
    }

    pub fn deny_permission(mut self) -> Self {
        self.deny = true;
        self
    }

    pub fn without(mut self, kind: TrackKind) -> Self {
        self.missing.insert(kind);
        self
    }

    fn codec(kind: TrackKind) -> RTCRtpCodecCapability {
        match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCapture {
    async fn open(&self, kind: TrackKind) -> Result<Arc<TrackLocalStaticSample>> {
        if self.deny {
            return Err(Error::PermissionDenied(format!(
                "{} capture refused by user",
                kind
            )));
        }
        if self.missing.contains(&kind) {
            return Err(Error::DeviceUnavailable(kind));
        }
        Ok(Arc::new(TrackLocalStaticSample::new(
            Self::codec(kind),
            format!("{}-{}", self.stream_id, kind),
            self.stream_id.clone(),
        )))
    }
}

/// Feeds placeholder frames into every local track until all of them stop.
pub fn spawn_sample_pump(tracks: LocalTracks) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut audio_tick = tokio::time::interval(AUDIO_FRAME);
        let mut video_tick = tokio::time::interval(VIDEO_FRAME);
        let audio = Sample {
            data: Bytes::from_static(OPUS_SILENCE),
            duration: AUDIO_FRAME,
            ..Default::default()
        };
        let video = Sample {
            data: Bytes::from(vec![0u8; 64]),
            duration: VIDEO_FRAME,
            ..Default::default()
        };

        while !tracks.all_stopped() {
            let (kind, sample) = tokio::select! {
                _ = audio_tick.tick() => (TrackKind::Audio, &audio),
                _ = video_tick.tick() => (TrackKind::Video, &video),
            };
            for track in tracks.of_kind(kind) {
                if let Err(e) = track.write_sample(sample).await {
                    warn!("Sample write failed on {}: {}", track.id(), e);
                }
            }
        }
        debug!("Sample pump finished");
    })
}
