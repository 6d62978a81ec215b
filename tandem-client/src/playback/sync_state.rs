use tandem_core::{PeerId, PlaybackState};
use tracing::debug;

use crate::playback::{PlayerSnapshot, PlayerUpdate, SyncConfig};

/// Why a remote state or drift tick led to no player change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Written by this participant.
    SelfAuthored,
    /// Older than the most recent local write, inside the echo window.
    EchoSuppressed,
    /// Older than the freshness window.
    Stale,
    NoSharedState,
    /// Drift is only checked while the local player is playing.
    NotPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    Applied(PlayerUpdate),
    InSync,
    Ignored(IgnoreReason),
}

/// Result of a local player action.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalDecision {
    Publish(PlaybackState),
    /// Held back by the debounce window. The latest deferred value is
    /// published at `flush_at`.
    Deferred { flush_at: i64 },
}

/// Suppression of remote states that predate the most recent local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoGuard {
    Idle,
    Suppressing { written_at: i64, until: i64 },
}

/// Reconciliation core of one participant. Pure: callers pass the current
/// wall-clock time and the player snapshot.
#[derive(Debug)]
pub struct SyncState {
    self_id: PeerId,
    config: SyncConfig,
    echo: EchoGuard,
    last_write: Option<PlaybackState>,
    pending: Option<PlaybackState>,
    shared: Option<PlaybackState>,
}

impl SyncState {
    pub fn new(self_id: PeerId, config: SyncConfig) -> Self {
        Self {
            self_id,
            config,
            echo: EchoGuard::Idle,
            last_write: None,
            pending: None,
            shared: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn echo_guard(&self) -> EchoGuard {
        self.echo
    }

    /// Latest known value of the shared slot.
    pub fn shared(&self) -> Option<&PlaybackState> {
        self.shared.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wall-clock time at which the deferred write is due.
    pub fn pending_flush_at(&self) -> Option<i64> {
        let pending = self.pending.as_ref()?;
        let last = self.last_write.as_ref().map_or(pending.timestamp, |w| w.timestamp);
        Some(last + self.config.debounce_ms)
    }

    /// A play, pause or seek done on the local player.
    ///
    /// A play/pause transition is published at once and drops any deferred
    /// seek. A seek published within the debounce window of the previous
    /// write replaces the deferred value instead of producing another write.
    pub fn local_action(&mut self, is_playing: bool, current_time: f64, now: i64) -> LocalDecision {
        let state = PlaybackState::new(is_playing, current_time, now, self.self_id.clone());
        let transition = self.shared.as_ref().map(|s| s.is_playing) != Some(is_playing);

        if !transition {
            if let Some(last) = &self.last_write {
                if now - last.timestamp < self.config.debounce_ms {
                    let flush_at = last.timestamp + self.config.debounce_ms;
                    self.pending = Some(state);
                    return LocalDecision::Deferred { flush_at };
                }
            }
        }

        self.pending = None;
        self.record_write(&state, now);
        LocalDecision::Publish(state)
    }

    /// Releases the deferred seek, if any. A playing position is advanced by
    /// the time it was held back.
    pub fn flush_pending(&mut self, now: i64) -> Option<PlaybackState> {
        let pending = self.pending.take()?;
        let held_ms = if pending.is_playing {
            (now - pending.timestamp).max(0)
        } else {
            0
        };
        let state = PlaybackState::new(
            pending.is_playing,
            pending.current_time + held_ms as f64 / 1000.0,
            now,
            self.self_id.clone(),
        );
        self.record_write(&state, now);
        Some(state)
    }

    fn record_write(&mut self, state: &PlaybackState, now: i64) {
        self.last_write = Some(state.clone());
        self.shared = Some(state.clone());
        self.echo = EchoGuard::Suppressing {
            written_at: state.timestamp,
            until: now + self.config.echo_window_ms,
        };
    }

    /// A change of the shared slot.
    pub fn remote_update(
        &mut self,
        state: PlaybackState,
        local: PlayerSnapshot,
        now: i64,
    ) -> SyncOutcome {
        if state.updated_by == self.self_id {
            return SyncOutcome::Ignored(IgnoreReason::SelfAuthored);
        }

        if let EchoGuard::Suppressing { written_at, until } = self.echo {
            if now >= until {
                self.echo = EchoGuard::Idle;
            } else if state.timestamp <= written_at {
                debug!("Suppressing remote state older than own write");
                return SyncOutcome::Ignored(IgnoreReason::EchoSuppressed);
            }
        }

        self.shared = Some(state.clone());

        if state.age_ms(now) > self.config.freshness_window_ms {
            debug!("Ignoring stale playback state ({} ms old)", state.age_ms(now));
            return SyncOutcome::Ignored(IgnoreReason::Stale);
        }

        reconcile(&state, local, now, self.config.reconcile_threshold_secs)
    }

    /// Periodic re-check against the shared slot, as just read from the store.
    /// No freshness limit applies: a playing state stays valid however old.
    pub fn drift_check(
        &mut self,
        shared: Option<PlaybackState>,
        local: PlayerSnapshot,
        now: i64,
    ) -> SyncOutcome {
        if !local.is_playing {
            return SyncOutcome::Ignored(IgnoreReason::NotPlaying);
        }
        if let Some(shared) = shared {
            self.shared = Some(shared);
        }
        let Some(shared) = &self.shared else {
            return SyncOutcome::Ignored(IgnoreReason::NoSharedState);
        };
        if shared.updated_by == self.self_id {
            return SyncOutcome::Ignored(IgnoreReason::SelfAuthored);
        }
        reconcile(shared, local, now, self.config.drift_threshold_secs)
    }
}

fn reconcile(
    state: &PlaybackState,
    local: PlayerSnapshot,
    now: i64,
    threshold_secs: f64,
) -> SyncOutcome {
    let predicted = state.predicted_time(now);
    let seek = (local.current_time - predicted).abs() > threshold_secs;

    if !seek && local.is_playing == state.is_playing {
        return SyncOutcome::InSync;
    }

    SyncOutcome::Applied(PlayerUpdate {
        is_playing: state.is_playing,
        current_time: if seek { predicted } else { local.current_time },
        seek,
    })
}
