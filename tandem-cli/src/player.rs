use std::sync::Mutex;
use std::time::Instant;

use colored::*;
use tandem_client::{LocalPlayer, PlayerSnapshot, PlayerUpdate};

struct Position {
    is_playing: bool,
    base: f64,
    since: Instant,
}

impl Position {
    fn current_time(&self) -> f64 {
        if self.is_playing {
            self.base + self.since.elapsed().as_secs_f64()
        } else {
            self.base
        }
    }
}

/// A player whose position advances with wall time while playing.
/// A `rate` other than 1.0 makes it drift away from the room.
pub struct SimulatedPlayer {
    name: String,
    rate: f64,
    position: Mutex<Position>,
}

impl SimulatedPlayer {
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            rate,
            position: Mutex::new(Position {
                is_playing: false,
                base: 0.0,
                since: Instant::now(),
            }),
        }
    }

    /// Changes the local player as a user would.
    pub fn user_action(&self, is_playing: bool, current_time: f64) {
        self.set(is_playing, current_time);
    }

    pub fn status(&self) -> String {
        let snapshot = self.snapshot();
        let state = if snapshot.is_playing {
            "playing".green()
        } else {
            "paused".yellow()
        };
        format!("{} {:>7.1}s", state, snapshot.current_time)
    }

    fn set(&self, is_playing: bool, current_time: f64) {
        if let Ok(mut position) = self.position.lock() {
            *position = Position {
                is_playing,
                base: current_time,
                since: Instant::now(),
            };
        }
    }
}

impl LocalPlayer for SimulatedPlayer {
    fn snapshot(&self) -> PlayerSnapshot {
        match self.position.lock() {
            Ok(position) => {
                let elapsed = position.current_time() - position.base;
                PlayerSnapshot {
                    is_playing: position.is_playing,
                    current_time: position.base + elapsed * self.rate,
                }
            }
            Err(_) => PlayerSnapshot {
                is_playing: false,
                current_time: 0.0,
            },
        }
    }

    fn apply(&self, update: PlayerUpdate) {
        let action = match (update.is_playing, update.seek) {
            (true, true) => "play + seek",
            (false, true) => "pause + seek",
            (true, false) => "play",
            (false, false) => "pause",
        };
        println!(
            "   {} {} {} to {:.1}s",
            "▶".cyan(),
            self.name.bold(),
            action,
            update.current_time
        );
        self.set(update.is_playing, update.current_time);
    }
}
