// Sequencer module
// Number sequence playback: descriptor, state machine, effects and clock labels

pub mod clock;
pub mod descriptor;
pub mod effect;
pub mod error;
pub mod player;
pub mod state;

pub use clock::{format_clock, parse_clock, pause_label};
pub use descriptor::SequenceDescriptor;
pub use effect::{
    COMPLETION_NOTE, CheckpointRequest, CompletionRequest, PlayerEffect, ProofImage, SeekRequest,
};
pub use error::PlayerError;
pub use player::{CompletionStatus, SequencePlayer};
pub use state::{PlaybackState, PlayerState};
