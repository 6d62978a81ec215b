use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tandem_core::{IceCandidate, PeerId, SdpType, SessionDescription, TrackKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

use crate::media::{LocalTracks, RemoteTrack};
use crate::transport::{
    ConnectionId, PeerTransport, TransportConfig, TransportEvent, TransportFactory,
};

fn codec_type(kind: TrackKind) -> RTPCodecType {
    match kind {
        TrackKind::Audio => RTPCodecType::Audio,
        TrackKind::Video => RTPCodecType::Video,
    }
}

fn track_kind(codec: RTPCodecType) -> Option<TrackKind> {
    match codec {
        RTPCodecType::Audio => Some(TrackKind::Audio),
        RTPCodecType::Video => Some(TrackKind::Video),
        _ => None,
    }
}

fn to_rtc_description(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp.clone())?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp.clone())?,
    };
    Ok(rtc)
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_candidate(candidate: &IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate.clone(),
        sdp_mid: candidate.sdp_mid.clone(),
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment.clone(),
    }
}

/// A webrtc-rs peer connection to one remote participant.
pub struct ConnectionWrapper {
    pub peer_id: PeerId,
    connection_id: ConnectionId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl ConnectionWrapper {
    /// Creates the connection and wires its callbacks to `event_tx`.
    pub async fn new(
        api: &API,
        peer_id: PeerId,
        connection_id: ConnectionId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let rtc_config = RTCConfiguration {
            ice_servers: config.rtc_ice_servers(),
            ..Default::default()
        };
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection {} to {:?} is {:?}", connection_id, uid, s);
                    let _ = tx
                        .send(TransportEvent::StateChanged(uid, connection_id, s.into()))
                        .await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(
                        uid,
                        connection_id,
                        from_rtc_candidate(init),
                    ))
                    .await;
            })
        }));

        let track_tx = event_tx;
        let uid_track = peer_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    let Some(kind) = track_kind(track.kind()) else {
                        return;
                    };
                    debug!(
                        "Remote {} track {} (stream {}) from {:?}",
                        kind,
                        track.id(),
                        track.stream_id(),
                        uid
                    );
                    let mut remote = RemoteTrack::new(kind, track.id(), track.stream_id());
                    remote.track = Some(track);
                    let _ = tx
                        .send(TransportEvent::RemoteTrack(uid, connection_id, remote))
                        .await;
                })
            },
        ));

        Ok(Self {
            peer_id,
            connection_id,
            peer_connection,
        })
    }

    /// Makes sure the offer can receive every kind even when we send none of it.
    async fn ensure_receivers(&self) -> Result<()> {
        let transceivers = self.peer_connection.get_transceivers().await;
        for kind in [TrackKind::Audio, TrackKind::Video] {
            let codec = codec_type(kind);
            if transceivers.iter().any(|t| t.kind() == codec) {
                continue;
            }
            self.peer_connection
                .add_transceiver_from_kind(
                    codec,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PeerTransport for ConnectionWrapper {
    fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    async fn add_local_tracks(&self, tracks: &LocalTracks) -> Result<()> {
        for track in tracks.iter() {
            let sender = self
                .peer_connection
                .add_track(track.rtc_track())
                .await
                .with_context(|| format!("Failed to add {} track", track.kind()))?;

            // RTCP has to be drained for interceptors (NACK, reports) to work.
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while sender.read(&mut rtcp_buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_receivers().await?;
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn accept_offer(&self, offer: &SessionDescription) -> Result<SessionDescription> {
        self.peer_connection
            .set_remote_description(to_rtc_description(offer)?)
            .await?;
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn accept_answer(&self, answer: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc_description(answer)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates `ConnectionWrapper`s sharing one media engine and interceptor set.
pub struct WebRtcTransportFactory {
    api: Arc<API>,
    config: TransportConfig,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        if config.ice_servers.is_empty() {
            warn!("Transport configured without any ICE servers");
        }

        Ok(Self {
            api: Arc::new(api),
            config,
        })
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let wrapper = ConnectionWrapper::new(
            &self.api,
            peer_id.clone(),
            connection_id,
            &self.config,
            event_tx,
        )
        .await?;
        Ok(Box::new(wrapper))
    }
}
