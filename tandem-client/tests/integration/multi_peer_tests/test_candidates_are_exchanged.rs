use std::sync::Arc;

use tandem_client::MemorySignalingStore;

use crate::integration::{create_test_peer, init_tracing, wait_for_connected};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_candidates_reach_only_their_target() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);
    let c = create_test_peer("c", &store, &log);

    a.session.connect().await.expect("Connect a failed");
    b.session.connect().await.expect("Connect b failed");
    assert!(wait_for_connected(&a, 1, 5000).await);
    assert!(wait_for_connected(&b, 1, 5000).await);

    // c is the second connection of both a and b.
    c.session.connect().await.expect("Connect c failed");
    for peer in [&a, &b, &c] {
        assert!(wait_for_connected(peer, 2, 5000).await);
    }

    let start = std::time::Instant::now();
    while log.remote_candidates_at(&c.id).await.len() < 2 {
        assert!(start.elapsed().as_millis() < 5000, "c never got both candidates");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let mut at_c = log.remote_candidates_at(&c.id).await;
    at_c.sort();
    assert_eq!(at_c, vec!["candidate:a-c-2", "candidate:b-c-2"]);

    for peer in [&a, &b, &c] {
        peer.session.disconnect().await;
    }
}
