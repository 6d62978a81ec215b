use std::sync::Arc;

use tandem_client::MemorySignalingStore;

use crate::integration::{TestPeer, create_test_peer, init_tracing, wait_for_connected};
use crate::utils::NegotiationLog;

async fn join_in_order(order: [&str; 3]) -> (Vec<TestPeer>, NegotiationLog) {
    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();

    let mut peers = Vec::new();
    for id in order {
        let peer = create_test_peer(id, &store, &log);
        peer.session.connect().await.expect("Connect failed");
        peers.push(peer);
    }
    for peer in &peers {
        assert!(
            wait_for_connected(peer, 2, 5000).await,
            "{} did not connect to both others",
            peer.id
        );
    }
    (peers, log)
}

async fn assert_one_offer_per_pair(peers: &[TestPeer], log: &NegotiationLog) {
    for (i, a) in peers.iter().enumerate() {
        for b in &peers[i + 1..] {
            assert_eq!(
                log.offers_between(&a.id, &b.id).await,
                1,
                "expected exactly one offer between {} and {}",
                a.id,
                b.id
            );
        }
    }
    for (from, to) in log.offers().await {
        assert!(from < to, "{from} offered to {to}");
    }
    assert_eq!(log.answers().await.len(), 3);
}

#[tokio::test]
async fn test_one_offer_per_pair_in_id_order() {
    init_tracing();

    let (peers, log) = join_in_order(["a", "b", "c"]).await;
    assert_one_offer_per_pair(&peers, &log).await;

    for peer in &peers {
        peer.session.disconnect().await;
    }
}

#[tokio::test]
async fn test_one_offer_per_pair_in_reverse_order() {
    init_tracing();

    let (peers, log) = join_in_order(["c", "b", "a"]).await;
    assert_one_offer_per_pair(&peers, &log).await;

    for peer in &peers {
        peer.session.disconnect().await;
    }
}

#[tokio::test]
async fn test_concurrent_joins_still_offer_once() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer("a", &store, &log);
    let b = create_test_peer("b", &store, &log);

    let (ra, rb) = tokio::join!(a.session.connect(), b.session.connect());
    ra.expect("Connect a failed");
    rb.expect("Connect b failed");

    assert!(wait_for_connected(&a, 1, 5000).await);
    assert!(wait_for_connected(&b, 1, 5000).await);
    assert_eq!(log.offers_between(&a.id, &b.id).await, 1);

    let streams = b.session.remote_peers().await;
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].0, a.id);
    assert_eq!(streams[0].1.tracks.len(), 2);

    a.session.disconnect().await;
    b.session.disconnect().await;
}
