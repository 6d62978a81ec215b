use std::sync::Arc;

use tandem_client::MemorySignalingStore;
use tandem_core::RoomId;

use crate::integration::{ROOM, create_test_peer, init_tracing, peer_states};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_join_empty_room_publishes_presence_only() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);

    a.session.connect().await.expect("Connect failed");
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let record = store
        .document(&RoomId::from(ROOM), "a")
        .expect("Presence record missing");
    assert_eq!(record["userId"], "a");
    assert!(record["offer"].is_null());
    assert!(record["answer"].is_null());

    assert!(log.offers().await.is_empty());
    assert!(peer_states(&a).await.is_empty());
    assert_eq!(a.factory.created_count(), 0);

    a.session.disconnect().await;
}

#[tokio::test]
async fn test_second_connect_is_a_no_op() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);

    a.session.connect().await.expect("Connect failed");
    let first = a.session.local_tracks().await.expect("No local tracks");
    a.session.connect().await.expect("Second connect failed");
    let second = a.session.local_tracks().await.expect("No local tracks");

    assert_eq!(
        first.iter().map(|t| t.id().to_owned()).collect::<Vec<_>>(),
        second.iter().map(|t| t.id().to_owned()).collect::<Vec<_>>()
    );
    assert_eq!(store.subscriber_count(&RoomId::from(ROOM)), 1);

    a.session.disconnect().await;
}
