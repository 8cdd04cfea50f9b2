// Player state - lifecycle of a playback session and its position/time counters

use std::fmt;

/// Player lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Created, not started yet
    Idle,
    /// Countdowns armed
    Running,
    /// Countdowns cancelled, position kept
    Paused,
    /// Sequence exhausted (terminal for the session)
    Completed,
}

impl PlayerState {
    /// Check if the countdowns are armed
    pub fn is_running(&self) -> bool {
        matches!(self, PlayerState::Running)
    }

    /// Check if the player is suspended
    pub fn is_paused(&self) -> bool {
        matches!(self, PlayerState::Paused)
    }

    /// Check if the sequence is over
    pub fn is_finished(&self) -> bool {
        matches!(self, PlayerState::Completed)
    }

    /// Manual stepping is meant for a stopped player
    pub fn can_step(&self) -> bool {
        matches!(self, PlayerState::Idle | PlayerState::Paused)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        PlayerState::Idle
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Idle => "idle",
            PlayerState::Running => "running",
            PlayerState::Paused => "paused",
            PlayerState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Position and time counters, owned by a single player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Index of the value currently shown/announced
    pub current_index: usize,
    /// Active seconds, including previous sessions
    pub elapsed: u64,
    /// Seconds left until the sequence is exhausted
    pub remaining: u64,
    /// Automatic advances handled this session
    pub advances: usize,
    /// Note attached to the latest pause
    pub pending_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_helpers() {
        assert!(PlayerState::Running.is_running());
        assert!(!PlayerState::Running.can_step());

        assert!(PlayerState::Paused.is_paused());
        assert!(PlayerState::Paused.can_step());
        assert!(PlayerState::Idle.can_step());

        assert!(PlayerState::Completed.is_finished());
        assert!(!PlayerState::Completed.can_step());

        assert_eq!(PlayerState::default(), PlayerState::Idle);
        assert_eq!(PlayerState::Paused.to_string(), "paused");
    }
}
