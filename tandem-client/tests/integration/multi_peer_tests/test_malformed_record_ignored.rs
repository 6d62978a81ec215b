use std::sync::Arc;

use serde_json::json;
use tandem_client::{MemorySignalingStore, PeerState, SignalingStore};
use tandem_core::RoomId;

use crate::integration::{ROOM, create_test_peer, init_tracing, peer_states, wait_for_connected};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_malformed_records_do_not_disturb_the_mesh() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);

    a.session.connect().await.expect("Connect a failed");
    b.session.connect().await.expect("Connect b failed");
    assert!(wait_for_connected(&a, 1, 5000).await);
    assert!(wait_for_connected(&b, 1, 5000).await);

    let room = RoomId::from(ROOM);
    store
        .upsert(&room, "garbage", json!({"userId": 42}))
        .await
        .unwrap();
    store
        .upsert(&room, "b", json!({"candidates": "not-a-list"}))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(peer_states(&a).await, vec![(b.id.clone(), PeerState::Connected)]);
    assert!(!a.observer.has_disconnect(&b.id).await);
    assert_eq!(log.offers().await.len(), 1);

    a.session.disconnect().await;
    b.session.disconnect().await;
}
