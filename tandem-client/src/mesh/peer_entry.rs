use std::collections::{HashSet, VecDeque};

use tandem_core::{IceCandidate, PeerId, SessionId};
use tracing::{debug, warn};

use crate::mesh::{InvalidTransition, PeerState};
use crate::transport::{ConnectionId, PeerTransport};

/// Remote candidates of one connection.
///
/// Candidates wait in FIFO order until the remote description is applied, are
/// flushed exactly once, and are applied directly from then on.
#[derive(Debug)]
pub enum CandidateQueue {
    Pending(VecDeque<IceCandidate>),
    Flushed,
}

impl Default for CandidateQueue {
    fn default() -> Self {
        CandidateQueue::Pending(VecDeque::new())
    }
}

impl CandidateQueue {
    pub fn is_flushed(&self) -> bool {
        matches!(self, CandidateQueue::Flushed)
    }

    pub fn len(&self) -> usize {
        match self {
            CandidateQueue::Pending(queue) => queue.len(),
            CandidateQueue::Flushed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues the candidate, or hands it back when it can be applied now.
    pub fn push(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        match self {
            CandidateQueue::Pending(queue) => {
                queue.push_back(candidate);
                None
            }
            CandidateQueue::Flushed => Some(candidate),
        }
    }

    /// Drains the queue. Returns `None` after the first call.
    pub fn flush(&mut self) -> Option<VecDeque<IceCandidate>> {
        match std::mem::replace(self, CandidateQueue::Flushed) {
            CandidateQueue::Pending(queue) => Some(queue),
            CandidateQueue::Flushed => None,
        }
    }
}

/// One connection to one remote participant, owned by the mesh.
pub struct PeerConnectionEntry {
    pub peer_id: PeerId,
    /// The remote participant's session this connection negotiates with.
    pub remote_session: SessionId,
    pub transport: Box<dyn PeerTransport>,
    state: PeerState,
    pub pending_candidates: CandidateQueue,
    seen_candidates: HashSet<String>,
}

impl PeerConnectionEntry {
    pub fn new(
        peer_id: PeerId,
        remote_session: SessionId,
        transport: Box<dyn PeerTransport>,
    ) -> Self {
        Self {
            peer_id,
            remote_session,
            transport,
            state: PeerState::New,
            pending_candidates: CandidateQueue::default(),
            seen_candidates: HashSet::new(),
        }
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.transport.connection_id()
    }

    pub fn transition(&mut self, next: PeerState) -> Result<(), InvalidTransition> {
        self.state = self.state.transition(next)?;
        debug!("Peer {:?} -> {}", self.peer_id, self.state);
        Ok(())
    }

    pub fn has_remote_description(&self) -> bool {
        self.pending_candidates.is_flushed()
    }

    /// Applies a remote candidate or queues it. Candidates already seen on
    /// this connection are skipped, since the whole candidate list is
    /// redelivered with every record change.
    pub async fn add_remote_candidate(&mut self, candidate: &IceCandidate) {
        if !self.seen_candidates.insert(candidate.candidate.clone()) {
            return;
        }
        match self.pending_candidates.push(candidate.clone()) {
            Some(candidate) => self.apply_candidate(&candidate).await,
            None => debug!(
                "Queued candidate for {:?} ({} pending)",
                self.peer_id,
                self.pending_candidates.len()
            ),
        }
    }

    /// Called once the remote description is in place.
    pub async fn flush_candidates(&mut self) {
        let Some(queued) = self.pending_candidates.flush() else {
            return;
        };
        if !queued.is_empty() {
            debug!("Applying {} queued candidates for {:?}", queued.len(), self.peer_id);
        }
        for candidate in queued {
            self.apply_candidate(&candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: &IceCandidate) {
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {:?}: {:?}", self.peer_id, e);
        }
    }
}
