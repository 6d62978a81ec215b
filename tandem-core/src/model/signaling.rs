use crate::model::peer::{PeerId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// Session description in the shape browsers serialise `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// A local candidate published for exactly one session of one remote peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntry {
    pub candidate: IceCandidate,
    pub target_peer_id: PeerId,
    #[serde(default)]
    pub target_session_id: Option<SessionId>,
}

/// The single mutable signaling slot a participant owns inside a room.
///
/// Only the owner writes it. An offer or answer is addressed by
/// `target_peer_id` and `target_session_id`; every candidate carries its own
/// target. A reader applies only what is addressed to its current session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignalingRecord {
    pub user_id: PeerId,
    #[serde(default)]
    pub session_id: SessionId,
    // Written as explicit nulls so a merging store clears stale slots.
    #[serde(default)]
    pub offer: Option<SessionDescription>,
    #[serde(default)]
    pub answer: Option<SessionDescription>,
    #[serde(default)]
    pub target_peer_id: Option<PeerId>,
    #[serde(default)]
    pub target_session_id: Option<SessionId>,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
    #[serde(default)]
    pub timestamp: i64,
}

impl SignalingRecord {
    pub fn presence(user_id: PeerId, session_id: SessionId, timestamp: i64) -> Self {
        Self {
            user_id,
            session_id,
            offer: None,
            answer: None,
            target_peer_id: None,
            target_session_id: None,
            candidates: Vec::new(),
            timestamp,
        }
    }

    fn is_addressed_to(&self, peer_id: &PeerId, session_id: &SessionId) -> bool {
        self.target_peer_id.as_ref() == Some(peer_id)
            && self.target_session_id.as_ref() == Some(session_id)
    }

    pub fn offer_for(
        &self,
        peer_id: &PeerId,
        session_id: &SessionId,
    ) -> Option<&SessionDescription> {
        self.offer
            .as_ref()
            .filter(|_| self.is_addressed_to(peer_id, session_id))
    }

    pub fn answer_for(
        &self,
        peer_id: &PeerId,
        session_id: &SessionId,
    ) -> Option<&SessionDescription> {
        self.answer
            .as_ref()
            .filter(|_| self.is_addressed_to(peer_id, session_id))
    }

    pub fn candidates_for<'a>(
        &'a self,
        peer_id: &'a PeerId,
        session_id: &'a SessionId,
    ) -> impl Iterator<Item = &'a IceCandidate> + 'a {
        self.candidates
            .iter()
            .filter(move |entry| {
                &entry.target_peer_id == peer_id
                    && entry.target_session_id.as_ref() == Some(session_id)
            })
            .map(|entry| &entry.candidate)
    }

    /// Replaces the addressed description with an offer. Any earlier answer is
    /// dropped so it can never appear addressed to the new target.
    pub fn set_offer(
        &mut self,
        target: PeerId,
        target_session: SessionId,
        offer: SessionDescription,
        timestamp: i64,
    ) {
        self.offer = Some(offer);
        self.answer = None;
        self.target_peer_id = Some(target);
        self.target_session_id = Some(target_session);
        self.timestamp = timestamp;
    }

    pub fn set_answer(
        &mut self,
        target: PeerId,
        target_session: SessionId,
        answer: SessionDescription,
        timestamp: i64,
    ) {
        self.answer = Some(answer);
        self.offer = None;
        self.target_peer_id = Some(target);
        self.target_session_id = Some(target_session);
        self.timestamp = timestamp;
    }

    pub fn push_candidate(
        &mut self,
        target: PeerId,
        target_session: SessionId,
        candidate: IceCandidate,
        timestamp: i64,
    ) {
        let entry = CandidateEntry {
            candidate,
            target_peer_id: target,
            target_session_id: Some(target_session),
        };
        if !self.candidates.contains(&entry) {
            self.candidates.push(entry);
        }
        self.timestamp = timestamp;
    }

    /// Drops the description and every candidate addressed to `peer_id`.
    /// Returns whether anything changed.
    pub fn forget(&mut self, peer_id: &PeerId, timestamp: i64) -> bool {
        let mut changed = false;
        if self.target_peer_id.as_ref() == Some(peer_id) {
            self.offer = None;
            self.answer = None;
            self.target_peer_id = None;
            self.target_session_id = None;
            changed = true;
        }
        let before = self.candidates.len();
        self.candidates.retain(|entry| &entry.target_peer_id != peer_id);
        changed |= self.candidates.len() != before;

        if changed {
            self.timestamp = timestamp;
        }
        changed
    }
}
