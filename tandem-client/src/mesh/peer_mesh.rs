use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tandem_core::{IceCandidate, PeerId, SessionDescription, SessionId, SignalingRecord};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::media::{LocalTracks, RemoteStream, RemoteTrack};
use crate::mesh::{MeshCommand, MeshContext, MeshObserver, PeerConnectionEntry, PeerState};
use crate::signaling::{DocumentChange, SignalingClient, SignalingEvent, SignalingSubscription};
use crate::transport::{ConnectionId, TransportEvent, TransportFactory, TransportState};

/// Owns one connection per remote participant of a room and drives their
/// negotiation.
///
/// Every signaling change, transport event and command is handled to
/// completion inside `run` before the next one is taken, so handlers only
/// have to tolerate redelivery, never interleaving.
pub struct PeerMesh {
    signaling: Arc<SignalingClient>,
    factory: Arc<dyn TransportFactory>,
    observer: Arc<dyn MeshObserver>,
    local_tracks: LocalTracks,

    peers: HashMap<PeerId, PeerConnectionEntry>,

    /// Sessions torn down by a failure. Their records are ignored until they
    /// disappear or the peer joins again, so a dropped peer is never
    /// reconnected automatically.
    closed_peers: HashMap<PeerId, SessionId>,

    streams: Arc<DashMap<PeerId, RemoteStream>>,
    next_connection_id: u64,

    subscription: Option<SignalingSubscription>,
    command_rx: mpsc::Receiver<MeshCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    left: bool,
}

impl PeerMesh {
    pub fn new(
        signaling: Arc<SignalingClient>,
        factory: Arc<dyn TransportFactory>,
        observer: Arc<dyn MeshObserver>,
        local_tracks: LocalTracks,
    ) -> (Self, MeshHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let streams = Arc::new(DashMap::new());

        let handle = MeshHandle {
            command_tx,
            context: MeshContext::new(streams.clone()),
            signaling: signaling.clone(),
        };

        let mesh = Self {
            signaling,
            factory,
            observer,
            local_tracks,
            peers: HashMap::new(),
            closed_peers: HashMap::new(),
            streams,
            next_connection_id: 1,
            subscription: None,
            command_rx,
            transport_rx,
            transport_tx,
            left: false,
        };
        (mesh, handle)
    }

    pub fn self_id(&self) -> &PeerId {
        self.signaling.self_id()
    }

    pub fn session_id(&self) -> &SessionId {
        self.signaling.session_id()
    }

    pub fn context(&self) -> MeshContext {
        MeshContext::new(self.streams.clone())
    }

    pub fn peer_state(&self, peer_id: &PeerId) -> Option<PeerState> {
        self.peers.get(peer_id).map(|entry| entry.state())
    }

    pub fn peer_states(&self) -> Vec<(PeerId, PeerState)> {
        let mut states: Vec<_> = self
            .peers
            .iter()
            .map(|(peer_id, entry)| (peer_id.clone(), entry.state()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Publishes presence and subscribes to the room. A failure aborts the
    /// join; nothing stays published.
    pub async fn join(&mut self) -> Result<()> {
        if self.left {
            return Err(Error::AlreadyClosed);
        }
        let subscription = self.signaling.join().await?;
        self.subscription = Some(subscription);
        info!(
            "{:?} joined room {} with {} local tracks",
            self.self_id(),
            self.signaling.room_id(),
            self.local_tracks.len()
        );
        Ok(())
    }

    /// Main loop. Returns after `leave`, or when every handle is dropped.
    pub async fn run(mut self) {
        info!("Mesh event loop started for {:?}", self.self_id());

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MeshCommand::Leave { done }) => {
                            self.leave().await;
                            let _ = done.send(());
                            break;
                        }
                        Some(MeshCommand::Snapshot { reply }) => {
                            let _ = reply.send(self.peer_states());
                        }
                        None => {
                            info!("Command channel closed. Leaving room.");
                            self.leave().await;
                            break;
                        }
                    }
                }

                change = next_change(&mut self.subscription) => {
                    match change {
                        Some(change) => self.handle_change(change).await,
                        None => {
                            warn!("Signaling subscription ended");
                            self.subscription = None;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }
            }
        }

        info!("Mesh event loop finished");
    }

    async fn handle_change(&mut self, change: DocumentChange) {
        match self.signaling.parse_change(change) {
            Ok(Some(event)) => self.handle_signaling_event(event).await,
            Ok(None) => {}
            Err(e) => warn!("Ignoring signaling change: {}", e),
        }
    }

    pub async fn handle_signaling_event(&mut self, event: SignalingEvent) {
        if self.left {
            return;
        }
        match event {
            SignalingEvent::PeerDiscovered(record) => self.handle_record(record, true).await,
            SignalingEvent::RecordChanged(record) => self.handle_record(record, false).await,
            SignalingEvent::PeerRemoved(peer_id) => {
                info!("Peer {:?} left the room", peer_id);
                self.closed_peers.remove(&peer_id);
                self.teardown(&peer_id).await;
            }
        }
    }

    async fn handle_record(&mut self, record: SignalingRecord, mut discovered: bool) {
        let peer_id = record.user_id.clone();
        match self.closed_peers.get(&peer_id) {
            Some(session) if *session == record.session_id => {
                debug!("Ignoring record of closed peer {:?}", peer_id);
                return;
            }
            Some(_) => {
                self.closed_peers.remove(&peer_id);
                discovered = true;
            }
            None => {}
        }

        let rejoined = self
            .peers
            .get(&peer_id)
            .is_some_and(|entry| entry.remote_session != record.session_id);
        if rejoined {
            info!("{:?} joined again with a new session", peer_id);
            self.teardown(&peer_id).await;
            discovered = true;
        }

        if let Err(e) = self.process_record(&record, discovered).await {
            self.fail_peer(&peer_id, record.session_id.clone(), e).await;
        }
    }

    async fn process_record(&mut self, record: &SignalingRecord, discovered: bool) -> Result<()> {
        let peer_id = &record.user_id;
        let remote_session = &record.session_id;
        let self_id = self.self_id().clone();
        let self_session = self.session_id().clone();

        if discovered && !self.peers.contains_key(peer_id) && self.should_offer(peer_id) {
            self.start_offer(peer_id, remote_session).await?;
        }
        if let Some(offer) = record.offer_for(&self_id, &self_session) {
            self.handle_offer(peer_id, remote_session, offer).await?;
        }
        if let Some(answer) = record.answer_for(&self_id, &self_session) {
            self.handle_answer(peer_id, answer).await?;
        }
        if let Some(entry) = self.peers.get_mut(peer_id) {
            for candidate in record.candidates_for(&self_id, &self_session) {
                entry.add_remote_candidate(candidate).await;
            }
        }
        Ok(())
    }

    /// Of every pair, only the peer with the smaller id offers.
    fn should_offer(&self, peer_id: &PeerId) -> bool {
        self.self_id() < peer_id
    }

    async fn create_entry(&mut self, peer_id: &PeerId, remote_session: &SessionId) -> Result<()> {
        let connection_id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;

        let transport = self
            .factory
            .create(peer_id, connection_id, self.transport_tx.clone())
            .await
            .map_err(|e| Error::transport(peer_id, e))?;

        if let Err(e) = transport.add_local_tracks(&self.local_tracks).await {
            let _ = transport.close().await;
            return Err(Error::transport(peer_id, e));
        }

        debug!("Created connection {} for {:?}", connection_id, peer_id);
        let entry = PeerConnectionEntry::new(peer_id.clone(), remote_session.clone(), transport);
        self.peers.insert(peer_id.clone(), entry);
        Ok(())
    }

    async fn start_offer(&mut self, peer_id: &PeerId, remote_session: &SessionId) -> Result<()> {
        info!("Discovered {:?}, sending offer", peer_id);
        self.create_entry(peer_id, remote_session).await?;

        let Some(entry) = self.peers.get_mut(peer_id) else {
            return Ok(());
        };
        let offer = entry
            .transport
            .create_offer()
            .await
            .map_err(|e| Error::transport(peer_id, e))?;
        entry
            .transition(PeerState::OfferSent)
            .map_err(|e| Error::transport(peer_id, e))?;

        self.signaling
            .publish_offer(peer_id, remote_session, offer)
            .await
    }

    /// Only a peer we have no connection with is answered. Since only the
    /// smaller id offers, an offer never meets one of ours for the same pair.
    async fn handle_offer(
        &mut self,
        peer_id: &PeerId,
        remote_session: &SessionId,
        offer: &SessionDescription,
    ) -> Result<()> {
        if let Some(state) = self.peer_state(peer_id) {
            debug!("Ignoring offer from {:?} in state {}", peer_id, state);
            return Ok(());
        }

        info!("Answering offer from {:?}", peer_id);
        self.create_entry(peer_id, remote_session).await?;

        let Some(entry) = self.peers.get_mut(peer_id) else {
            return Ok(());
        };
        let answer = entry
            .transport
            .accept_offer(offer)
            .await
            .map_err(|e| Error::transport(peer_id, e))?;
        entry
            .transition(PeerState::AnswerSent)
            .map_err(|e| Error::transport(peer_id, e))?;

        self.signaling
            .publish_answer(peer_id, remote_session, answer)
            .await?;

        if let Some(entry) = self.peers.get_mut(peer_id) {
            entry.flush_candidates().await;
        }
        Ok(())
    }

    async fn handle_answer(&mut self, peer_id: &PeerId, answer: &SessionDescription) -> Result<()> {
        let Some(entry) = self.peers.get_mut(peer_id) else {
            debug!("Answer from unknown peer {:?}", peer_id);
            return Ok(());
        };
        if entry.state() != PeerState::OfferSent || entry.has_remote_description() {
            return Ok(());
        }

        info!("Applying answer from {:?}", peer_id);
        entry
            .transport
            .accept_answer(answer)
            .await
            .map_err(|e| Error::transport(peer_id, e))?;
        entry.flush_candidates().await;
        Ok(())
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.left {
            return;
        }
        let peer_id = event.peer_id().clone();
        let Some(entry) = self.peers.get_mut(&peer_id) else {
            debug!("Transport event for unknown peer {:?}", peer_id);
            return;
        };
        if entry.connection_id() != event.connection_id() {
            debug!(
                "Stale transport event {} for {:?}",
                event.connection_id(),
                peer_id
            );
            return;
        }
        let remote_session = entry.remote_session.clone();

        match event {
            TransportEvent::StateChanged(_, _, TransportState::Connected) => {
                if entry.state().is_negotiating() {
                    let _ = entry.transition(PeerState::Connected);
                    info!("Connected to {:?}", peer_id);
                }
            }

            TransportEvent::StateChanged(_, _, state) if state.is_terminal() => {
                let e = Error::transport(&peer_id, format!("{state:?}"));
                self.fail_peer(&peer_id, remote_session, e).await;
            }

            TransportEvent::StateChanged(..) => {}

            TransportEvent::CandidateGenerated(_, _, candidate) => {
                self.publish_candidate(&peer_id, &remote_session, candidate)
                    .await;
            }

            TransportEvent::RemoteTrack(_, _, track) => {
                self.add_remote_track(&peer_id, track).await;
            }
        }
    }

    async fn publish_candidate(
        &self,
        peer_id: &PeerId,
        remote_session: &SessionId,
        candidate: IceCandidate,
    ) {
        if let Err(e) = self
            .signaling
            .publish_candidate(peer_id, remote_session, candidate)
            .await
        {
            warn!("Failed to publish candidate for {:?}: {}", peer_id, e);
        }
    }

    async fn add_remote_track(&mut self, peer_id: &PeerId, track: RemoteTrack) {
        let stream = {
            let mut stream = self
                .streams
                .entry(peer_id.clone())
                .or_insert_with(|| RemoteStream::new(peer_id.clone()));
            if !stream.add_track(track) {
                return;
            }
            stream.clone()
        };

        let ctx = self.context();
        self.observer
            .on_remote_stream(&ctx, peer_id.clone(), stream)
            .await;
    }

    /// Tears down one peer after an error. Other peers are not touched.
    async fn fail_peer(&mut self, peer_id: &PeerId, session: SessionId, e: Error) {
        error!("Dropping peer {:?}: {}", peer_id, e);
        self.closed_peers.insert(peer_id.clone(), session);
        self.teardown(peer_id).await;
    }

    /// Closes the connection to `peer_id` and clears everything our record
    /// still addresses to it, so a later session of that peer starts clean.
    async fn teardown(&mut self, peer_id: &PeerId) {
        if let Err(e) = self.signaling.forget(peer_id).await {
            warn!("Failed to clear signaling for {:?}: {}", peer_id, e);
        }

        let Some(mut entry) = self.peers.remove(peer_id) else {
            return;
        };
        let _ = entry.transition(PeerState::Disconnected);
        if let Err(e) = entry.transport.close().await {
            debug!("Error closing connection to {:?}: {:?}", peer_id, e);
        }
        self.streams.remove(peer_id);

        let ctx = self.context();
        self.observer.on_peer_disconnected(&ctx, peer_id.clone()).await;
    }

    /// Unsubscribes, closes every connection, stops local media and deletes
    /// the own record, in that order. Later calls do nothing.
    pub async fn leave(&mut self) {
        if self.left {
            return;
        }
        self.left = true;

        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }

        for (peer_id, mut entry) in self.peers.drain() {
            let _ = entry.transition(PeerState::Disconnected);
            if let Err(e) = entry.transport.close().await {
                debug!("Error closing connection to {:?}: {:?}", peer_id, e);
            }
        }
        self.streams.clear();
        self.closed_peers.clear();

        self.local_tracks.stop_all();

        if let Err(e) = self.signaling.leave().await {
            warn!("Failed to delete signaling record: {}", e);
        }
        info!("{:?} left the room", self.self_id());
    }
}

async fn next_change(subscription: &mut Option<SignalingSubscription>) -> Option<DocumentChange> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

/// Handle to a running mesh. Cheap to clone.
#[derive(Clone)]
pub struct MeshHandle {
    command_tx: mpsc::Sender<MeshCommand>,
    context: MeshContext,
    signaling: Arc<SignalingClient>,
}

impl MeshHandle {
    /// Leaves the room. Safe to call any number of times, including after the
    /// mesh loop has stopped.
    pub async fn leave(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        if self.command_tx.send(MeshCommand::Leave { done }).await.is_err() {
            return self.signaling.leave().await;
        }
        let _ = wait.await;
        Ok(())
    }

    /// Current negotiation state of every peer. Empty once the mesh stopped.
    pub async fn peer_states(&self) -> Vec<(PeerId, PeerState)> {
        let (reply, rx) = oneshot::channel();
        if self
            .command_tx
            .send(MeshCommand::Snapshot { reply })
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    pub fn remote_streams(&self) -> Vec<(PeerId, RemoteStream)> {
        self.context.remote_streams()
    }

    pub fn context(&self) -> &MeshContext {
        &self.context
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }
}
