use std::sync::Arc;

use tandem_client::{ConnectionId, MemorySignalingStore, PeerState, TransportState};

use crate::integration::{create_test_peer, init_tracing, peer_states, wait_for_connected};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_failed_transport_drops_only_that_peer() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);
    let c = create_test_peer("c", &store, &log);

    for peer in [&a, &b, &c] {
        peer.session.connect().await.expect("Connect failed");
    }
    for peer in [&a, &b, &c] {
        assert!(wait_for_connected(peer, 2, 5000).await);
    }

    assert!(b.factory.report_state(&a.id, TransportState::Failed).await);
    assert!(b.observer.wait_for_disconnect(&a.id, 5000).await);

    assert!(wait_for_connected(&b, 1, 5000).await);
    assert_eq!(peer_states(&b).await, vec![(c.id.clone(), PeerState::Connected)]);
    assert!(peer_states(&c).await.contains(&(b.id.clone(), PeerState::Connected)));
    assert_eq!(b.observer.disconnect_count().await, 1);
    assert!(!c.observer.has_disconnect(&b.id).await);

    let remote: Vec<_> = b
        .session
        .remote_peers()
        .await
        .into_iter()
        .map(|(peer_id, _)| peer_id)
        .collect();
    assert_eq!(remote, vec![c.id.clone()]);

    for peer in [&a, &b, &c] {
        peer.session.disconnect().await;
    }
}

#[tokio::test]
async fn test_failed_peer_is_not_reconnected_from_stale_record() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);

    a.session.connect().await.expect("Connect a failed");
    b.session.connect().await.expect("Connect b failed");
    assert!(wait_for_connected(&b, 1, 5000).await);

    assert!(b.factory.report_state(&a.id, TransportState::Disconnected).await);
    assert!(b.observer.wait_for_disconnect(&a.id, 5000).await);

    // a keeps rewriting its record while it connects to c; b must not pick it up again.
    let c = create_test_peer("c", &store, &log);
    c.session.connect().await.expect("Connect c failed");
    assert!(wait_for_connected(&c, 2, 5000).await);

    assert!(!peer_states(&b).await.iter().any(|(id, _)| id == &a.id));
    assert_eq!(b.factory.created_count(), 2);

    for peer in [&a, &b, &c] {
        peer.session.disconnect().await;
    }
}

#[tokio::test]
async fn test_stale_connection_events_are_ignored() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);

    a.session.connect().await.expect("Connect a failed");
    b.session.connect().await.expect("Connect b failed");
    assert!(wait_for_connected(&a, 1, 5000).await);

    assert!(
        a.factory
            .report_stale_state(&b.id, ConnectionId(999), TransportState::Closed)
            .await
    );
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(peer_states(&a).await, vec![(b.id.clone(), PeerState::Connected)]);
    assert!(!a.observer.has_disconnect(&b.id).await);

    a.session.disconnect().await;
    b.session.disconnect().await;
}
