use std::sync::Arc;

use tandem_client::{Error, MemorySignalingStore};
use tandem_core::RoomId;

use crate::integration::{ROOM, create_test_peer, init_tracing};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_subscribe_failure_aborts_join_and_allows_retry() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);

    store.fail_subscriptions(true);
    let err = a.session.connect().await.expect_err("Connect should fail");

    assert!(matches!(err, Error::Store(_)));
    assert!(!a.session.is_connected().await);
    assert!(store.keys(&RoomId::from(ROOM)).is_empty());

    store.fail_subscriptions(false);
    a.session.connect().await.expect("Retry failed");
    assert!(a.session.is_connected().await);
    assert!(store.document(&RoomId::from(ROOM), "a").is_some());

    a.session.disconnect().await;
}
