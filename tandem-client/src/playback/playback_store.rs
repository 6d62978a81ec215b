use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tandem_core::{PlaybackState, RoomId};
use tokio::sync::watch;

use crate::error::Result;

/// The shared per-room playback slot (external collaborator). Writes
/// overwrite; subscribers see the latest value.
#[async_trait]
pub trait PlaybackStore: Send + Sync + 'static {
    async fn write(&self, room_id: &RoomId, state: PlaybackState) -> Result<()>;

    async fn read(&self, room_id: &RoomId) -> Result<Option<PlaybackState>>;

    /// The receiver is marked changed, so the current value is delivered
    /// first.
    async fn subscribe(&self, room_id: &RoomId) -> Result<watch::Receiver<Option<PlaybackState>>>;
}

#[derive(Default)]
pub struct MemoryPlaybackStore {
    rooms: DashMap<RoomId, watch::Sender<Option<PlaybackState>>>,
    writes: AtomicUsize,
}

impl MemoryPlaybackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes so far, across all rooms.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn sender(&self, room_id: &RoomId) -> watch::Sender<Option<PlaybackState>> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }
}

#[async_trait]
impl PlaybackStore for MemoryPlaybackStore {
    async fn write(&self, room_id: &RoomId, state: PlaybackState) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.sender(room_id).send_replace(Some(state));
        Ok(())
    }

    async fn read(&self, room_id: &RoomId) -> Result<Option<PlaybackState>> {
        Ok(self.sender(room_id).borrow().clone())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<watch::Receiver<Option<PlaybackState>>> {
        let mut rx = self.sender(room_id).subscribe();
        rx.mark_changed();
        Ok(rx)
    }
}
