//! Integration tests for tandem-client.
//!
//! Tests are organized by functionality:
//! - `connection_tests` - joining, leaving and failed joins of one session
//! - `multi_peer_tests` - mesh negotiation between several sessions
//! - `playback_tests` - shared playback synchronisation

pub mod playback_tests;

use std::sync::Arc;

use tandem_client::{
    CallSession, Clock, LocalTracks, ManualClock, MediaConstraints, MemoryPlaybackStore,
    MemorySignalingStore, PeerMesh, PeerState, PlaybackHandle, PlaybackSyncEngine,
    SignalingClient, SyncConfig, SyntheticCapture,
};
use tandem_core::{PeerId, RoomId};
use tracing::Level;

use crate::utils::{MockTransportFactory, NegotiationLog, TestMeshObserver, TestPlayer};

pub const ROOM: &str = "movie-night";

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A participant wired to the in-memory store and mock transports.
pub struct TestPeer {
    pub id: PeerId,
    pub session: CallSession,
    pub observer: TestMeshObserver,
    pub factory: Arc<MockTransportFactory>,
}

pub fn create_test_peer(
    id: &str,
    store: &Arc<MemorySignalingStore>,
    log: &NegotiationLog,
) -> TestPeer {
    create_test_peer_with(id, store, log, SyntheticCapture::new(id))
}

pub fn create_test_peer_with(
    id: &str,
    store: &Arc<MemorySignalingStore>,
    log: &NegotiationLog,
    device: SyntheticCapture,
) -> TestPeer {
    let peer_id = PeerId::from(id);
    let observer = TestMeshObserver::new();
    let factory = Arc::new(MockTransportFactory::new(peer_id.clone(), log.clone()));

    let session = CallSession::new(
        RoomId::from(ROOM),
        peer_id.clone(),
        MediaConstraints::default(),
        store.clone(),
        factory.clone(),
        Arc::new(device),
        Arc::new(observer.clone()),
    );

    TestPeer {
        id: peer_id,
        session,
        observer,
        factory,
    }
}

/// A mesh driven directly through its handlers, without a running loop.
pub fn mesh_for(
    id: &str,
    store: &Arc<MemorySignalingStore>,
    log: &NegotiationLog,
) -> (PeerMesh, Arc<MockTransportFactory>) {
    let me = PeerId::from(id);
    let signaling = Arc::new(SignalingClient::new(
        store.clone(),
        Arc::new(ManualClock::new(1_000)),
        RoomId::from(ROOM),
        me.clone(),
    ));
    let factory = Arc::new(MockTransportFactory::new(me, log.clone()));
    let (mesh, _handle) = PeerMesh::new(
        signaling,
        factory.clone(),
        Arc::new(TestMeshObserver::new()),
        LocalTracks::default(),
    );
    (mesh, factory)
}

/// Polls the mesh until exactly `count` peers are connected.
pub async fn wait_for_connected(peer: &TestPeer, count: usize, timeout_ms: u64) -> bool {
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if let Some(mesh) = peer.session.mesh().await {
            let connected = mesh
                .peer_states()
                .await
                .iter()
                .filter(|(_, state)| *state == PeerState::Connected)
                .count();
            if connected == count {
                return true;
            }
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

pub async fn peer_states(peer: &TestPeer) -> Vec<(PeerId, PeerState)> {
    match peer.session.mesh().await {
        Some(mesh) => mesh.peer_states().await,
        None => Vec::new(),
    }
}

/// Starts a sync engine for `id` and spawns its loop.
pub async fn start_engine(
    id: &str,
    store: &Arc<MemoryPlaybackStore>,
    clock: &Arc<ManualClock>,
    player: &TestPlayer,
) -> PlaybackHandle {
    let clock: Arc<dyn Clock> = clock.clone();
    let (engine, handle) = PlaybackSyncEngine::new(
        RoomId::from(ROOM),
        PeerId::from(id),
        store.clone(),
        Arc::new(player.clone()),
        clock,
        SyncConfig::default(),
    )
    .await
    .expect("Failed to start sync engine");

    tokio::spawn(engine.run());
    handle
}
