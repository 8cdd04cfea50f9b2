// Session - runs a player against real time, speech and the progress store

pub mod driver;
pub mod handle;
pub mod snapshot;

pub use driver::{PlayerSession, SessionOptions};
pub use handle::{PlayerCommand, SessionHandle};
pub use snapshot::PlaybackSnapshot;
