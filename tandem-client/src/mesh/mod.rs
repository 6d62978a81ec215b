mod mesh_command;
mod mesh_context;
mod mesh_observer;
mod peer_entry;
mod peer_mesh;
mod peer_state;

pub use mesh_command::*;
pub use mesh_context::*;
pub use mesh_observer::*;
pub use peer_entry::*;
pub use peer_mesh::*;
pub use peer_state::*;
