use serde::{Deserialize, Serialize};

/// Tuning of the playback synchronisation. All times are milliseconds unless
/// the field name says seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Remote states older than this are ignored.
    pub freshness_window_ms: i64,
    /// Minimum spacing of seek-only writes.
    pub debounce_ms: i64,
    /// Offset that triggers a seek on a remote update.
    pub reconcile_threshold_secs: f64,
    /// Offset that triggers a seek on the periodic drift check.
    pub drift_threshold_secs: f64,
    pub drift_interval_ms: u64,
    /// How long older remote states are suppressed after a local write.
    pub echo_window_ms: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 5_000,
            debounce_ms: 200,
            reconcile_threshold_secs: 2.0,
            drift_threshold_secs: 1.5,
            drift_interval_ms: 3_000,
            echo_window_ms: 1_000,
        }
    }
}
