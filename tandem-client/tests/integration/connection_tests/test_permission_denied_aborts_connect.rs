use std::sync::Arc;

use tandem_client::{Error, MemorySignalingStore, SyntheticCapture};
use tandem_core::RoomId;

use crate::integration::{ROOM, create_test_peer_with, init_tracing};
use crate::utils::NegotiationLog;

#[tokio::test]
async fn test_permission_denied_aborts_connect() {
    init_tracing();

    let store = Arc::new(MemorySignalingStore::new());
    let log = NegotiationLog::new();
    let a = create_test_peer_with("a", &store, &log, SyntheticCapture::new("a").deny_permission());

    let err = a.session.connect().await.expect_err("Connect should fail");

    assert!(matches!(err, Error::PermissionDenied(_)));
    assert!(!a.session.is_connected().await);
    assert!(a.session.local_tracks().await.is_none());
    assert!(store.keys(&RoomId::from(ROOM)).is_empty());
}
