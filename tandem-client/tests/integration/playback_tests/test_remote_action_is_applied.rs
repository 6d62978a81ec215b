use std::sync::Arc;
use std::time::Duration;

use tandem_client::{ManualClock, MemoryPlaybackStore, PlaybackStore};
use tandem_core::{PeerId, PlaybackState, RoomId};

use crate::integration::{ROOM, init_tracing, start_engine};
use crate::utils::TestPlayer;

#[tokio::test]
async fn test_play_on_one_peer_starts_the_other() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let player_a = TestPlayer::new(false, 0.0);
    let player_b = TestPlayer::new(false, 0.0);

    let a = start_engine("a", &store, &clock, &player_a).await;
    let _b = start_engine("b", &store, &clock, &player_b).await;

    player_a.set(true, 10.0);
    a.play(10.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let applied = player_b.applied();
    assert_eq!(applied.len(), 1);
    assert!(applied[0].is_playing);
    assert!(applied[0].seek);
    assert_eq!(applied[0].current_time, 10.0);

    assert!(player_a.applied().is_empty(), "a reacted to its own write");
}

#[tokio::test]
async fn test_pause_is_matched_without_seek() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let player_a = TestPlayer::new(true, 20.0);
    let player_b = TestPlayer::new(true, 20.5);

    let a = start_engine("a", &store, &clock, &player_a).await;
    let _b = start_engine("b", &store, &clock, &player_b).await;

    a.pause(20.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let applied = player_b.applied();
    assert_eq!(applied.len(), 1);
    assert!(!applied[0].is_playing);
    assert!(!applied[0].seek);
    assert_eq!(applied[0].current_time, 20.5);
}

#[tokio::test]
async fn test_stale_state_on_join_is_ignored() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let room = RoomId::from(ROOM);
    store
        .write(
            &room,
            PlaybackState::new(false, 42.5, 1_000_000 - 60_000, PeerId::from("a")),
        )
        .await
        .unwrap();

    let player = TestPlayer::new(false, 0.0);
    let _b = start_engine("b", &store, &clock, &player).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(player.applied().is_empty());
}

#[tokio::test]
async fn test_stopped_engine_rejects_actions() {
    init_tracing();

    let store = Arc::new(MemoryPlaybackStore::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let player = TestPlayer::new(false, 0.0);
    let a = start_engine("a", &store, &clock, &player).await;

    a.stop().await;
    a.stop().await;

    assert!(a.play(1.0).await.is_err());
    assert!(!a.is_running());
}
