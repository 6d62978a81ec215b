use std::sync::Arc;
use std::time::Duration;

use tandem_core::{PeerId, PlaybackState, RoomId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::playback::{
    LocalDecision, LocalPlayer, PlaybackStore, SyncConfig, SyncOutcome, SyncState,
};

enum PlaybackCommand {
    LocalAction { is_playing: bool, current_time: f64 },
    Seek { current_time: f64 },
    Stop { done: oneshot::Sender<()> },
}

/// Keeps the local player aligned with the room's shared playback slot.
pub struct PlaybackSyncEngine {
    room_id: RoomId,
    store: Arc<dyn PlaybackStore>,
    player: Arc<dyn LocalPlayer>,
    clock: Arc<dyn Clock>,
    sync: SyncState,
    updates: watch::Receiver<Option<PlaybackState>>,
    command_rx: mpsc::Receiver<PlaybackCommand>,
}

impl PlaybackSyncEngine {
    /// Subscribes to the room's playback slot. A subscription failure is
    /// returned to the caller.
    pub async fn new(
        room_id: RoomId,
        self_id: PeerId,
        store: Arc<dyn PlaybackStore>,
        player: Arc<dyn LocalPlayer>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Result<(Self, PlaybackHandle)> {
        let updates = store.subscribe(&room_id).await?;
        let (command_tx, command_rx) = mpsc::channel(64);

        let engine = Self {
            room_id,
            store,
            player,
            clock,
            sync: SyncState::new(self_id, config),
            updates,
            command_rx,
        };
        Ok((engine, PlaybackHandle { command_tx }))
    }

    pub async fn run(mut self) {
        info!("Playback sync started for room {}", self.room_id);

        let period = Duration::from_millis(self.sync.config().drift_interval_ms.max(1));
        let mut drift = tokio::time::interval_at(Instant::now() + period, period);
        drift.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut watching = true;

        loop {
            let flush_delay = self.flush_delay();

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PlaybackCommand::LocalAction { is_playing, current_time }) => {
                            self.publish_local_action(is_playing, current_time).await;
                        }
                        Some(PlaybackCommand::Seek { current_time }) => {
                            let is_playing = self.player.snapshot().is_playing;
                            self.publish_local_action(is_playing, current_time).await;
                        }
                        Some(PlaybackCommand::Stop { done }) => {
                            self.flush().await;
                            let _ = done.send(());
                            break;
                        }
                        None => {
                            self.flush().await;
                            break;
                        }
                    }
                }

                changed = self.updates.changed(), if watching => {
                    if changed.is_err() {
                        warn!("Playback store closed the subscription");
                        watching = false;
                        continue;
                    }
                    let state = self.updates.borrow_and_update().clone();
                    if let Some(state) = state {
                        self.on_remote_update(state);
                    }
                }

                _ = drift.tick() => {
                    self.drift_check().await;
                }

                _ = sleep_for(flush_delay) => self.flush().await,
            }
        }

        info!("Playback sync stopped for room {}", self.room_id);
    }

    fn flush_delay(&self) -> Option<Duration> {
        let flush_at = self.sync.pending_flush_at()?;
        let delay = (flush_at - self.clock.now_ms()).max(0) as u64;
        Some(Duration::from_millis(delay))
    }

    pub async fn publish_local_action(&mut self, is_playing: bool, current_time: f64) {
        let now = self.clock.now_ms();
        match self.sync.local_action(is_playing, current_time, now) {
            LocalDecision::Publish(state) => self.write(state).await,
            LocalDecision::Deferred { flush_at } => {
                debug!("Seek to {:.1}s deferred until {}", current_time, flush_at);
            }
        }
    }

    async fn flush(&mut self) {
        let now = self.clock.now_ms();
        if let Some(state) = self.sync.flush_pending(now) {
            self.write(state).await;
        }
    }

    async fn write(&self, state: PlaybackState) {
        debug!(
            "Publishing playback playing={} at {:.1}s",
            state.is_playing, state.current_time
        );
        if let Err(e) = self.store.write(&self.room_id, state).await {
            warn!("Failed to publish playback state: {}", e);
        }
    }

    pub fn on_remote_update(&mut self, state: PlaybackState) -> SyncOutcome {
        let now = self.clock.now_ms();
        let author = state.updated_by.clone();
        let outcome = self.sync.remote_update(state, self.player.snapshot(), now);
        self.apply(&outcome, "remote update");
        if let SyncOutcome::Ignored(reason) = outcome {
            debug!("Playback update from {:?} ignored: {:?}", author, reason);
        }
        outcome
    }

    async fn drift_check(&mut self) -> SyncOutcome {
        let local = self.player.snapshot();
        if !local.is_playing {
            return self.sync.drift_check(None, local, self.clock.now_ms());
        }

        let shared = match self.store.read(&self.room_id).await {
            Ok(shared) => shared,
            Err(e) => {
                warn!("Failed to read playback state: {}", e);
                None
            }
        };
        let outcome = self.sync.drift_check(shared, local, self.clock.now_ms());
        self.apply(&outcome, "drift correction");
        outcome
    }

    fn apply(&self, outcome: &SyncOutcome, cause: &str) {
        if let SyncOutcome::Applied(update) = outcome {
            info!(
                "Applying {}: playing={} at {:.1}s (seek={})",
                cause, update.is_playing, update.current_time, update.seek
            );
            self.player.apply(*update);
        }
    }
}

async fn sleep_for(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

/// UI-side handle of a running engine. Cheap to clone.
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: mpsc::Sender<PlaybackCommand>,
}

impl PlaybackHandle {
    /// Reports a play, pause or seek performed on the local player.
    pub async fn report_local_action(&self, is_playing: bool, current_time: f64) -> Result<()> {
        self.send(PlaybackCommand::LocalAction {
            is_playing,
            current_time,
        })
        .await
    }

    pub async fn play(&self, current_time: f64) -> Result<()> {
        self.report_local_action(true, current_time).await
    }

    pub async fn pause(&self, current_time: f64) -> Result<()> {
        self.report_local_action(false, current_time).await
    }

    /// Seeks without changing play state.
    pub async fn seek(&self, current_time: f64) -> Result<()> {
        self.send(PlaybackCommand::Seek { current_time }).await
    }

    /// Publishes any deferred seek and stops the engine. Idempotent.
    pub async fn stop(&self) {
        let (done, wait) = oneshot::channel();
        if self
            .command_tx
            .send(PlaybackCommand::Stop { done })
            .await
            .is_ok()
        {
            let _ = wait.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    async fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| Error::AlreadyClosed)
    }
}
