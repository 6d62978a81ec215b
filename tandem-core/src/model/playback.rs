use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

/// The single shared playback slot of a room. Last writer wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Position in seconds, never negative.
    pub current_time: f64,
    /// Wall-clock milliseconds of the write.
    pub timestamp: i64,
    pub updated_by: PeerId,
}

impl PlaybackState {
    pub fn new(is_playing: bool, current_time: f64, timestamp: i64, updated_by: PeerId) -> Self {
        Self {
            is_playing,
            current_time: truncate_to_tenth(current_time),
            timestamp,
            updated_by,
        }
    }

    /// Position extrapolated to `now_ms`. A paused state does not advance.
    pub fn predicted_time(&self, now_ms: i64) -> f64 {
        if !self.is_playing {
            return self.current_time;
        }
        let elapsed_ms = (now_ms - self.timestamp).max(0);
        self.current_time + elapsed_ms as f64 / 1000.0
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }
}

/// Floors a position to one decimal place and clamps it at zero.
pub fn truncate_to_tenth(seconds: f64) -> f64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0.0;
    }
    (seconds * 10.0).floor() / 10.0
}
