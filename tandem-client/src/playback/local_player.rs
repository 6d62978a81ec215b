/// What the visible player currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub is_playing: bool,
    pub current_time: f64,
}

/// A reconciled state the visible player has to adopt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerUpdate {
    pub is_playing: bool,
    pub current_time: f64,
    /// Whether `current_time` differs enough that the player must seek.
    pub seek: bool,
}

/// The UI's video element as seen by the sync engine.
pub trait LocalPlayer: Send + Sync + 'static {
    fn snapshot(&self) -> PlayerSnapshot;

    fn apply(&self, update: PlayerUpdate);
}
