// Sequence descriptor - the read-only input a player session starts from

use crate::project::Project;
use crate::sequencer::PlayerError;
use crate::sequencer::clock::parse_clock;
use std::time::Duration;

/// What to play, how fast, and where a previous session left off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDescriptor {
    /// Announced items, in order
    pub values: Vec<String>,
    /// Seconds allotted to each item
    pub interval_seconds: u32,
    /// Resume position, `values.len()` means already completed
    pub start_index: usize,
    /// Seconds spent in previous sessions
    pub elapsed_seconds: u64,
}

impl SequenceDescriptor {
    /// Create a descriptor starting from the first value
    pub fn new<I, S>(values: I, interval_seconds: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            interval_seconds,
            start_index: 0,
            elapsed_seconds: 0,
        }
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_elapsed(mut self, elapsed_seconds: u64) -> Self {
        self.elapsed_seconds = elapsed_seconds;
        self
    }

    /// Build the descriptor for a backend project
    pub fn from_project(project: &Project) -> Self {
        Self {
            values: project.numbers(),
            interval_seconds: project.gap,
            start_index: project.current_state as usize,
            elapsed_seconds: project
                .passed_time
                .as_deref()
                .and_then(parse_clock)
                .unwrap_or(0),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Start index clamped into `[0, len]`
    pub fn clamped_start(&self) -> usize {
        self.start_index.min(self.values.len())
    }

    /// True when the resume position is already past the last value
    pub fn is_exhausted(&self) -> bool {
        self.clamped_start() == self.values.len()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_seconds))
    }

    /// Seconds needed to play from `index` to the end
    pub fn seconds_from(&self, index: usize) -> u64 {
        self.values.len().saturating_sub(index) as u64 * u64::from(self.interval_seconds)
    }

    /// Reject inputs a player cannot run
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.interval_seconds == 0 {
            return Err(PlayerError::InvalidInterval(self.interval_seconds));
        }

        if let Some(position) = self.values.iter().position(|v| v.trim().is_empty()) {
            return Err(PlayerError::BlankValue(position));
        }

        Ok(())
    }
}
