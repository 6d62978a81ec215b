use std::sync::Arc;
use std::time::Duration;

use tandem_client::{ManualClock, MemoryPlaybackStore, PlaybackStore};
use tandem_core::RoomId;

use crate::integration::{ROOM, init_tracing, start_engine};
use crate::utils::TestPlayer;

#[tokio::test(start_paused = true)]
async fn test_rapid_seeks_collapse_into_two_writes() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let player = TestPlayer::new(true, 0.0);
    let a = start_engine("a", &store, &clock, &player).await;

    a.play(0.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(store.write_count(), 1);

    clock.advance(1_000);
    for step in 0..5 {
        a.seek(30.0 + step as f64).await.unwrap();
        clock.advance(40);
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.write_count(), 3);
    let shared = store.read(&RoomId::from(ROOM)).await.unwrap().unwrap();
    assert!(shared.is_playing);
    assert!(shared.current_time >= 34.0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_scrub_is_published_at_once() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let player = TestPlayer::new(true, 0.0);
    let a = start_engine("a", &store, &clock, &player).await;

    a.play(0.0).await.unwrap();
    a.seek(5.0).await.unwrap();
    a.pause(6.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(store.write_count(), 2);
    let shared = store.read(&RoomId::from(ROOM)).await.unwrap().unwrap();
    assert!(!shared.is_playing);
    assert_eq!(shared.current_time, 6.0);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.write_count(), 2, "dropped seek must not be flushed later");
}
