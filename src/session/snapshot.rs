// Playback snapshot - what the host displays

use crate::connection::StoreStatus;
use crate::sequencer::{CompletionStatus, PlayerState, SequencePlayer, format_clock};
use std::fmt;

/// Values shown on each side of the current one
pub const WINDOW_RADIUS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlayerState,
    pub current_index: usize,
    pub current_value: Option<String>,
    pub len: usize,
    pub elapsed: u64,
    pub remaining: u64,
    /// Seconds spent on the current value
    pub intra_step_elapsed: u64,
    pub interval_seconds: u32,
    pub advances: usize,
    pub pending_note: Option<String>,
    pub completion: CompletionStatus,
    pub store_status: StoreStatus,
    /// Values around the current one, `None` past either end
    pub window: Vec<Option<String>>,
}

impl PlaybackSnapshot {
    pub fn capture(player: &SequencePlayer, store_status: StoreStatus) -> Self {
        let playback = player.playback();
        Self {
            state: player.state(),
            current_index: playback.current_index,
            current_value: player.current_value().map(str::to_string),
            len: player.descriptor().len(),
            elapsed: playback.elapsed,
            remaining: playback.remaining,
            intra_step_elapsed: player.intra_step_elapsed(),
            interval_seconds: player.descriptor().interval_seconds,
            advances: playback.advances,
            pending_note: playback.pending_note.clone(),
            completion: player.completion_status(),
            store_status,
            window: player
                .window(WINDOW_RADIUS)
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect(),
        }
    }

    /// `3 / 10` style position, 1-based
    pub fn position_label(&self) -> String {
        if self.len == 0 {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.current_index + 1, self.len)
    }
}

impl fmt::Display for PlaybackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} value {} | elapsed {} | remaining {}",
            self.state,
            self.position_label(),
            self.current_value.as_deref().unwrap_or("-"),
            format_clock(self.elapsed),
            format_clock(self.remaining),
        )?;

        if self.store_status == StoreStatus::Offline {
            write!(f, " | offline")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::SequenceDescriptor;

    #[test]
    fn test_capture_running_player() {
        let mut player =
            SequencePlayer::new(SequenceDescriptor::new(["4", "8", "15"], 3).with_start_index(1));
        player.start().unwrap();
        player.tick();

        let snapshot = PlaybackSnapshot::capture(&player, StoreStatus::Online);
        assert_eq!(snapshot.state, PlayerState::Running);
        assert_eq!(snapshot.current_value.as_deref(), Some("8"));
        assert_eq!(snapshot.remaining, 5);
        assert_eq!(snapshot.intra_step_elapsed, 1);
        assert_eq!(snapshot.position_label(), "2 / 3");
        assert_eq!(snapshot.window.len(), 2 * WINDOW_RADIUS + 1);
        assert_eq!(snapshot.window[WINDOW_RADIUS].as_deref(), Some("8"));
    }

    #[test]
    fn test_display() {
        let player = SequencePlayer::new(SequenceDescriptor::new(["4", "8"], 2));
        let snapshot = PlaybackSnapshot::capture(&player, StoreStatus::Offline);

        assert_eq!(
            snapshot.to_string(),
            "[idle] 1 / 2 value 4 | elapsed 0:00 | remaining 0:04 | offline"
        );
    }
}
