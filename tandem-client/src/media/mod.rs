mod capture;
mod local_track;
mod remote;
mod synthetic;

pub use capture::*;
pub use local_track::*;
pub use remote::*;
pub use synthetic::*;
