// Errors raised by the sequence player

use crate::sequencer::state::PlayerState;
use crate::store::StoreError;

/// Errors that can occur while driving a player
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Interval must be a positive number of seconds
    #[error("Invalid configuration: interval must be at least 1 second (got {0})")]
    InvalidInterval(u32),

    /// Announced values cannot be blank
    #[error("Invalid configuration: value at position {0} is blank")]
    BlankValue(usize),

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: PlayerState,
    },

    #[error("Index {index} is out of range for a sequence of {len} values")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("A completion report is already in flight")]
    CompletionInFlight,

    #[error("Completion report failed: {0}")]
    Completion(#[source] StoreError),

    #[error("Player session is closed")]
    SessionClosed,
}

impl PlayerError {
    /// Configuration errors are only ever returned by `start()`
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PlayerError::InvalidInterval(_) | PlayerError::BlankValue(_)
        )
    }
}
