mod local_player;
mod playback_store;
mod sync_config;
mod sync_engine;
mod sync_state;

pub use local_player::*;
pub use playback_store::*;
pub use sync_config::*;
pub use sync_engine::*;
pub use sync_state::*;
