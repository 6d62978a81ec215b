use std::sync::Arc;

use tandem_client::{MemorySignalingStore, PeerState, SignalingEvent};
use tandem_core::{IceCandidate, PeerId, RoomId, SessionDescription, SessionId, SignalingRecord};

use crate::integration::{ROOM, init_tracing, mesh_for};
use crate::utils::{Negotiation, NegotiationLog};

fn presence(id: &str, session: &str) -> SignalingRecord {
    SignalingRecord::presence(PeerId::from(id), SessionId::from(session), 1_000)
}

#[tokio::test]
async fn test_offer_to_previous_session_is_not_answered() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let (mut mesh, factory) = mesh_for("b", &store, &log);
    let me = PeerId::from("b");
    let a = PeerId::from("a");

    // a's record still carries what it sent to b's earlier session.
    let mut record = presence("a", "a1");
    record.set_offer(
        me.clone(),
        SessionId::from("b-before"),
        SessionDescription::offer("offer a -> b #1"),
        1_001,
    );
    record.push_candidate(
        me.clone(),
        SessionId::from("b-before"),
        IceCandidate {
            candidate: "candidate:a-b-1".into(),
            ..Default::default()
        },
        1_002,
    );
    mesh.handle_signaling_event(SignalingEvent::PeerDiscovered(record.clone()))
        .await;

    assert_eq!(factory.created_count(), 0);
    assert!(log.answers().await.is_empty());
    assert_eq!(mesh.peer_state(&a), None);

    record.set_offer(
        me.clone(),
        mesh.session_id().clone(),
        SessionDescription::offer("offer a -> b #2"),
        1_003,
    );
    mesh.handle_signaling_event(SignalingEvent::RecordChanged(record))
        .await;

    assert_eq!(mesh.peer_state(&a), Some(PeerState::AnswerSent));
    assert!(log.remote_candidates_at(&me).await.is_empty());
    let published = store.document(&RoomId::from(ROOM), "b").unwrap();
    assert_eq!(published["answer"]["sdp"], "answer b -> a #2");
}

#[tokio::test]
async fn test_new_session_replaces_the_connection() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let (mut mesh, factory) = mesh_for("a", &store, &log);
    let b = PeerId::from("b");

    mesh.handle_signaling_event(SignalingEvent::PeerDiscovered(presence("b", "b1")))
        .await;
    assert_eq!(mesh.peer_state(&b), Some(PeerState::OfferSent));

    // b came back without its removal being observed.
    mesh.handle_signaling_event(SignalingEvent::RecordChanged(presence("b", "b2")))
        .await;

    assert_eq!(factory.created_count(), 2);
    assert_eq!(mesh.peer_state(&b), Some(PeerState::OfferSent));
    assert!(
        log.entries()
            .await
            .contains(&Negotiation::Closed { at: PeerId::from("a"), peer: b.clone() })
    );

    let published = store.document(&RoomId::from(ROOM), "a").unwrap();
    assert_eq!(published["offer"]["sdp"], "offer a -> b #2");
    assert_eq!(published["targetSessionId"], "b2");
}

#[tokio::test]
async fn test_departed_peer_is_forgotten_in_own_record() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let (mut mesh, _factory) = mesh_for("a", &store, &log);
    let b = PeerId::from("b");

    mesh.handle_signaling_event(SignalingEvent::PeerDiscovered(presence("b", "b1")))
        .await;
    let published = store.document(&RoomId::from(ROOM), "a").unwrap();
    assert_eq!(published["targetPeerId"], "b");

    mesh.handle_signaling_event(SignalingEvent::PeerRemoved(b)).await;

    let published = store.document(&RoomId::from(ROOM), "a").unwrap();
    assert!(published["offer"].is_null());
    assert!(published["targetPeerId"].is_null());
    assert!(published["targetSessionId"].is_null());
    assert_eq!(published["candidates"].as_array().map(Vec::len), Some(0));
}
