// Sequence Player - steps through a number sequence on a fixed cadence
// Pure state machine: every operation returns the effects the host must execute

use crate::project::ProjectStatus;
use crate::sequencer::descriptor::SequenceDescriptor;
use crate::sequencer::effect::{
    COMPLETION_NOTE, CheckpointRequest, CompletionRequest, PlayerEffect, ProofImage, SeekRequest,
};
use crate::sequencer::error::PlayerError;
use crate::sequencer::state::{PlaybackState, PlayerState};
use std::time::Duration;

/// Progress of the completion report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    NotReported,
    InFlight,
    Reported,
}

/// Sequence player
///
/// Owns the playback state of one session. The two countdowns (tick every
/// second, advance every interval) live in the host; it calls [`tick`] and
/// [`advance`] when they fire and arms/disarms them as the returned effects
/// say.
///
/// [`tick`]: SequencePlayer::tick
/// [`advance`]: SequencePlayer::advance
#[derive(Debug, Clone)]
pub struct SequencePlayer {
    descriptor: SequenceDescriptor,
    state: PlayerState,
    playback: PlaybackState,
    revision: u64,
    completion: CompletionStatus,
}

impl SequencePlayer {
    /// Create an idle player positioned at the descriptor's resume point
    pub fn new(descriptor: SequenceDescriptor) -> Self {
        let len = descriptor.len();
        let start = descriptor.clamped_start();
        let playback = PlaybackState {
            current_index: start.min(len.saturating_sub(1)),
            elapsed: descriptor.elapsed_seconds,
            remaining: descriptor.seconds_from(start),
            advances: 0,
            pending_note: None,
        };

        Self {
            descriptor,
            state: PlayerState::Idle,
            playback,
            revision: 0,
            completion: CompletionStatus::NotReported,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn descriptor(&self) -> &SequenceDescriptor {
        &self.descriptor
    }

    pub fn values(&self) -> &[String] {
        &self.descriptor.values
    }

    pub fn current_index(&self) -> usize {
        self.playback.current_index
    }

    pub fn remaining(&self) -> u64 {
        self.playback.remaining
    }

    pub fn elapsed(&self) -> u64 {
        self.playback.elapsed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn completion_status(&self) -> CompletionStatus {
        self.completion
    }

    /// Value at the current index (`None` for an empty sequence)
    pub fn current_value(&self) -> Option<&str> {
        self.descriptor
            .values
            .get(self.playback.current_index)
            .map(String::as_str)
    }

    /// Seconds already spent on the current item
    pub fn intra_step_elapsed(&self) -> u64 {
        self.descriptor
            .seconds_from(self.playback.current_index)
            .saturating_sub(self.playback.remaining)
    }

    /// Values around the current index, `radius` on each side
    ///
    /// Slots before the first or after the last value are `None`, so the
    /// current value is always at position `radius`.
    pub fn window(&self, radius: usize) -> Vec<Option<&str>> {
        let center = self.playback.current_index as isize;
        let radius = radius as isize;
        (center - radius..=center + radius)
            .map(|i| {
                usize::try_from(i)
                    .ok()
                    .and_then(|i| self.descriptor.values.get(i))
                    .map(String::as_str)
            })
            .collect()
    }

    /// Start the session
    ///
    /// Rejects invalid configuration without touching the playback state.
    /// An empty or already exhausted sequence completes immediately without
    /// any announcement.
    pub fn start(&mut self) -> Result<Vec<PlayerEffect>, PlayerError> {
        if self.state != PlayerState::Idle {
            return Err(PlayerError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        self.descriptor.validate()?;

        if self.descriptor.is_empty() || self.playback.remaining == 0 {
            tracing::debug!(
                len = self.descriptor.len(),
                "sequence has nothing left to play"
            );
            self.playback.remaining = 0;
            self.state = PlayerState::Completed;
            return Ok(vec![PlayerEffect::Finished]);
        }

        self.state = PlayerState::Running;
        let interval = self.descriptor.interval();

        Ok(vec![
            self.announcement(),
            PlayerEffect::ArmCountdowns {
                first_advance_in: self.next_advance_in(),
                interval,
            },
        ])
    }

    /// One second of active time has passed
    pub fn tick(&mut self) -> Vec<PlayerEffect> {
        if !self.state.is_running() {
            return Vec::new();
        }

        self.playback.elapsed += 1;
        self.playback.remaining = self.playback.remaining.saturating_sub(1);

        if self.playback.remaining == 0 {
            return self.finish();
        }

        Vec::new()
    }

    /// One interval has passed: move to the next value
    pub fn advance(&mut self) -> Vec<PlayerEffect> {
        if !self.state.is_running() {
            return Vec::new();
        }

        self.playback.advances += 1;
        let next = self.playback.current_index + 1;

        if next >= self.descriptor.len() {
            // The last item's time is up; count the tick that coincides with it
            self.playback.elapsed += self.playback.remaining;
            return self.finish();
        }

        self.playback.current_index = next;
        self.revision += 1;
        vec![self.announcement()]
    }

    /// Suspend playback and checkpoint the position
    pub fn pause(&mut self, note: Option<String>) -> Vec<PlayerEffect> {
        if !self.state.is_running() {
            tracing::debug!(state = %self.state, "pause ignored");
            return Vec::new();
        }

        if self.playback.remaining == 0 {
            return self.finish();
        }

        self.state = PlayerState::Paused;
        self.playback.pending_note = normalize_note(note);

        vec![
            PlayerEffect::DisarmCountdowns,
            PlayerEffect::Checkpoint(self.checkpoint_request()),
        ]
    }

    /// Attach (or replace) the note of the current pause
    pub fn annotate(&mut self, note: String) -> Vec<PlayerEffect> {
        if !self.state.is_paused() {
            tracing::debug!(state = %self.state, "annotate ignored");
            return Vec::new();
        }

        self.playback.pending_note = normalize_note(Some(note));
        vec![PlayerEffect::Checkpoint(self.checkpoint_request())]
    }

    /// Resume playback from the current position
    ///
    /// The countdowns restart cleanly: no missed ticks are replayed.
    pub fn resume(&mut self) -> Vec<PlayerEffect> {
        if !self.state.is_paused() {
            tracing::debug!(state = %self.state, "resume ignored");
            return Vec::new();
        }

        self.playback.pending_note = None;
        self.state = PlayerState::Running;

        vec![PlayerEffect::ArmCountdowns {
            first_advance_in: self.next_advance_in(),
            interval: self.descriptor.interval(),
        }]
    }

    /// Move one value back (stopped player only)
    pub fn step_back(&mut self) -> Vec<PlayerEffect> {
        self.step(-1)
    }

    /// Move one value forward (stopped player only)
    pub fn step_forward(&mut self) -> Vec<PlayerEffect> {
        self.step(1)
    }

    fn step(&mut self, delta: isize) -> Vec<PlayerEffect> {
        if !self.state.can_step() || self.descriptor.is_empty() {
            tracing::debug!(state = %self.state, "step ignored");
            return Vec::new();
        }

        let last = self.descriptor.len() - 1;
        let target = self
            .playback
            .current_index
            .saturating_add_signed(delta)
            .min(last);

        if target == self.playback.current_index {
            return Vec::new();
        }

        self.move_to(target);
        vec![self.announcement()]
    }

    /// Jump to `index` and persist it
    pub fn seek(&mut self, index: usize) -> Result<Vec<PlayerEffect>, PlayerError> {
        if self.state.is_finished() {
            tracing::debug!(index, "seek ignored, sequence completed");
            return Ok(Vec::new());
        }

        let len = self.descriptor.len();
        if index >= len {
            return Err(PlayerError::IndexOutOfRange { index, len });
        }

        self.move_to(index);

        let mut effects = vec![
            self.announcement(),
            PlayerEffect::SeekUpdate(SeekRequest {
                revision: self.revision,
                current_index: index,
            }),
        ];

        if self.state.is_running() {
            effects.push(PlayerEffect::ArmCountdowns {
                first_advance_in: self.next_advance_in(),
                interval: self.descriptor.interval(),
            });
        }

        Ok(effects)
    }

    /// Apply the index the store answered a seek with
    ///
    /// Ignored when the local position moved since the seek was sent
    /// (`revision` is stale) or the sequence is already completed.
    pub fn reconcile(&mut self, revision: u64, server_index: usize) -> Vec<PlayerEffect> {
        if revision != self.revision || self.state.is_finished() || self.descriptor.is_empty() {
            tracing::debug!(
                revision,
                current = self.revision,
                "stale or late reconciliation dropped"
            );
            return Vec::new();
        }

        let target = server_index.min(self.descriptor.len() - 1);
        if target == self.playback.current_index {
            return Vec::new();
        }

        tracing::info!(
            local = self.playback.current_index,
            server = target,
            "reconciling position with store"
        );
        self.move_to(target);

        let mut effects = vec![self.announcement()];
        if self.state.is_running() {
            effects.push(PlayerEffect::ArmCountdowns {
                first_advance_in: self.next_advance_in(),
                interval: self.descriptor.interval(),
            });
        }
        effects
    }

    /// Request the completion report
    pub fn report_completion(
        &mut self,
        proof: Option<ProofImage>,
    ) -> Result<Vec<PlayerEffect>, PlayerError> {
        if !self.state.is_finished() {
            return Err(PlayerError::InvalidState {
                operation: "report completion",
                state: self.state,
            });
        }

        match self.completion {
            CompletionStatus::InFlight => return Err(PlayerError::CompletionInFlight),
            CompletionStatus::Reported => return Ok(Vec::new()),
            CompletionStatus::NotReported => {}
        }

        self.completion = CompletionStatus::InFlight;

        Ok(vec![PlayerEffect::Complete(CompletionRequest {
            elapsed_seconds: self.playback.elapsed,
            note: COMPLETION_NOTE.to_string(),
            status: ProjectStatus::UnderReview,
            proof,
            paused_at: None,
        })])
    }

    /// The store accepted the completion report
    pub fn completion_confirmed(&mut self) {
        if self.completion != CompletionStatus::InFlight {
            return;
        }
        self.completion = CompletionStatus::Reported;
        self.playback.current_index = 0;
    }

    /// The completion report failed; another attempt may be made
    pub fn completion_failed(&mut self) {
        if self.completion == CompletionStatus::InFlight {
            self.completion = CompletionStatus::NotReported;
        }
    }

    fn finish(&mut self) -> Vec<PlayerEffect> {
        self.state = PlayerState::Completed;
        self.playback.remaining = 0;
        self.playback.pending_note = None;
        vec![PlayerEffect::DisarmCountdowns, PlayerEffect::Finished]
    }

    /// Every local index change bumps the revision
    fn move_to(&mut self, index: usize) {
        self.revision += 1;
        self.playback.current_index = index;
        self.playback.remaining = self.descriptor.seconds_from(index);
    }

    fn announcement(&self) -> PlayerEffect {
        let value = self.current_value().unwrap_or_default().to_string();
        PlayerEffect::Announce(value)
    }

    fn checkpoint_request(&self) -> CheckpointRequest {
        CheckpointRequest {
            current_index: self.playback.current_index,
            elapsed_seconds: self.playback.elapsed,
            note: self.playback.pending_note.clone(),
            paused_at: None,
        }
    }

    /// Delay until the current item's share of `remaining` runs out
    fn next_advance_in(&self) -> Duration {
        let interval = u64::from(self.descriptor.interval_seconds);
        let after_current = self
            .descriptor
            .seconds_from(self.playback.current_index + 1);
        let due = self.playback.remaining.saturating_sub(after_current);

        if due == 0 || due > interval {
            Duration::from_secs(interval)
        } else {
            Duration::from_secs(due)
        }
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(values: &[&str], interval: u32, start: usize) -> SequencePlayer {
        SequencePlayer::new(
            SequenceDescriptor::new(values.iter().copied(), interval).with_start_index(start),
        )
    }

    fn announcements(effects: &[PlayerEffect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                PlayerEffect::Announce(v) => Some(v.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_initializes_position_and_time() {
        for len in 1..6usize {
            for start in 0..len {
                for interval in [1u32, 2, 7] {
                    let values: Vec<String> = (0..len).map(|i| i.to_string()).collect();
                    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
                    let mut p = player(&refs, interval, start);

                    let effects = p.start().unwrap();

                    assert_eq!(p.state(), PlayerState::Running);
                    assert!(p.current_index() < len);
                    assert_eq!(
                        p.remaining(),
                        (len - p.current_index()) as u64 * interval as u64
                    );
                    assert_eq!(announcements(&effects), vec![values[start].as_str()]);
                }
            }
        }
    }

    #[test]
    fn test_start_rejects_zero_interval_without_mutation() {
        let mut p = player(&["1", "2"], 0, 1);
        let before = p.playback().clone();

        let result = p.start();

        assert!(matches!(result, Err(PlayerError::InvalidInterval(0))));
        assert!(result.unwrap_err().is_config_error());
        assert_eq!(p.playback(), &before);
        assert_eq!(p.state(), PlayerState::Idle);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut p = player(&["1"], 1, 0);
        p.start().unwrap();
        assert!(matches!(
            p.start(),
            Err(PlayerError::InvalidState { operation: "start", .. })
        ));
    }

    #[test]
    fn test_empty_sequence_completes_immediately() {
        let mut p = player(&[], 2, 0);
        let effects = p.start().unwrap();

        assert_eq!(p.state(), PlayerState::Completed);
        assert_eq!(p.remaining(), 0);
        assert_eq!(effects, vec![PlayerEffect::Finished]);
    }

    #[test]
    fn test_exhausted_start_index_completes_immediately() {
        let mut p = player(&["1", "2", "3"], 2, 3);
        let effects = p.start().unwrap();

        assert_eq!(p.state(), PlayerState::Completed);
        assert_eq!(p.current_index(), 2);
        assert!(announcements(&effects).is_empty());
    }

    #[test]
    fn test_pause_resume_without_tick_is_idempotent() {
        let mut p = player(&["1", "2", "3"], 2, 0);
        p.start().unwrap();
        p.tick();
        p.advance();
        let index = p.current_index();
        let remaining = p.remaining();

        p.pause(None);
        p.resume();

        assert_eq!(p.current_index(), index);
        assert_eq!(p.remaining(), remaining);
        assert_eq!(p.state(), PlayerState::Running);
    }

    #[test]
    fn test_advances_until_completed_match_remaining_values() {
        for len in 1..6usize {
            for start in 0..len {
                let values: Vec<String> = (0..len).map(|i| format!("v{}", i)).collect();
                let refs: Vec<&str> = values.iter().map(String::as_str).collect();
                let mut p = player(&refs, 3, start);
                p.start().unwrap();

                let mut last_announced = values[start].clone();
                while !p.state().is_finished() {
                    for value in announcements(&p.advance()) {
                        last_announced = value.to_string();
                    }
                    assert!(p.current_index() < len);
                }

                assert_eq!(p.playback().advances, len - start);
                assert_eq!(p.current_index(), len - 1);
                assert_eq!(last_announced, values[len - 1]);
            }
        }
    }

    #[test]
    fn test_final_advance_counts_coinciding_tick() {
        let mut p = player(&["1", "2", "3"], 2, 0);
        p.start().unwrap();

        for _ in 0..2 {
            p.tick();
            p.tick();
            p.advance();
        }
        p.tick();
        assert_eq!(p.remaining(), 1);

        let effects = p.advance();
        assert!(effects.contains(&PlayerEffect::Finished));
        assert_eq!(p.elapsed(), 6);
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn test_tick_exhaustion_completes() {
        let mut p = player(&["1", "2"], 1, 0);
        p.start().unwrap();

        assert!(p.tick().is_empty());
        let effects = p.tick();

        assert_eq!(
            effects,
            vec![PlayerEffect::DisarmCountdowns, PlayerEffect::Finished]
        );
        assert_eq!(p.state(), PlayerState::Completed);
        assert_eq!(p.elapsed(), 2);
        // Further ticks do nothing
        assert!(p.tick().is_empty());
        assert_eq!(p.elapsed(), 2);
    }

    #[test]
    fn test_scenario_three_values() {
        let mut p = player(&["1", "2", "3"], 2, 0);
        p.start().unwrap();
        assert_eq!(p.remaining(), 6);

        p.tick();
        p.tick();
        let effects = p.advance();
        assert_eq!(p.current_index(), 1);
        assert_eq!(announcements(&effects), vec!["2"]);

        let effects = p.pause(Some("  coffee  ".to_string()));
        assert_eq!(effects[0], PlayerEffect::DisarmCountdowns);
        match &effects[1] {
            PlayerEffect::Checkpoint(request) => {
                assert_eq!(request.current_index, 1);
                assert_eq!(request.elapsed_seconds, 2);
                assert_eq!(request.note.as_deref(), Some("coffee"));
            }
            other => panic!("Expected checkpoint, got {:?}", other),
        }

        // Nothing moves while paused
        assert!(p.tick().is_empty());
        assert!(p.advance().is_empty());
        assert_eq!(p.remaining(), 4);

        let effects = p.resume();
        assert_eq!(
            effects,
            vec![PlayerEffect::ArmCountdowns {
                first_advance_in: Duration::from_secs(2),
                interval: Duration::from_secs(2),
            }]
        );
        assert_eq!(p.remaining(), 4);
        assert!(p.playback().pending_note.is_none());
    }

    #[test]
    fn test_resume_mid_step_arms_remaining_share() {
        let mut p = player(&["1", "2", "3"], 4, 0);
        p.start().unwrap();
        p.tick();
        p.pause(None);
        assert_eq!(p.intra_step_elapsed(), 1);

        let effects = p.resume();
        assert_eq!(
            effects,
            vec![PlayerEffect::ArmCountdowns {
                first_advance_in: Duration::from_secs(3),
                interval: Duration::from_secs(4),
            }]
        );
    }

    #[test]
    fn test_annotate_only_while_paused() {
        let mut p = player(&["1", "2"], 2, 0);
        p.start().unwrap();
        assert!(p.annotate("ignored".to_string()).is_empty());

        p.pause(None);
        let effects = p.annotate("door bell".to_string());
        match &effects[..] {
            [PlayerEffect::Checkpoint(request)] => {
                assert_eq!(request.note.as_deref(), Some("door bell"));
            }
            other => panic!("Expected one checkpoint, got {:?}", other),
        }
    }

    #[test]
    fn test_steps_are_clamped_and_ignored_while_running() {
        let mut p = player(&["a", "b", "c"], 2, 0);

        // Idle stepping is allowed
        assert_eq!(announcements(&p.step_forward()), vec!["b"]);
        assert_eq!(p.remaining(), 4);
        assert_eq!(announcements(&p.step_back()), vec!["a"]);
        assert!(p.step_back().is_empty());
        assert_eq!(p.current_index(), 0);

        p.start().unwrap();
        assert!(p.step_forward().is_empty());
        assert_eq!(p.current_index(), 0);

        p.pause(None);
        p.step_forward();
        p.step_forward();
        assert!(p.step_forward().is_empty());
        assert_eq!(p.current_index(), 2);
        assert_eq!(p.remaining(), 2);
    }

    #[test]
    fn test_seek_announces_once_and_persists() {
        let mut p = player(&["a", "b", "c", "d"], 2, 0);
        p.start().unwrap();
        p.pause(None);

        for i in 0..4 {
            let effects = p.seek(i).unwrap();
            assert_eq!(announcements(&effects), vec![["a", "b", "c", "d"][i]]);
            assert!(effects.contains(&PlayerEffect::SeekUpdate(SeekRequest {
                revision: p.revision(),
                current_index: i,
            })));
            assert_eq!(p.remaining(), (4 - i) as u64 * 2);
        }

        assert!(matches!(
            p.seek(4),
            Err(PlayerError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert_eq!(p.current_index(), 3);
    }

    #[test]
    fn test_seek_while_running_rearms() {
        let mut p = player(&["a", "b", "c"], 2, 0);
        p.start().unwrap();

        let effects = p.seek(1).unwrap();
        assert!(effects.iter().any(|e| matches!(e, PlayerEffect::ArmCountdowns { .. })));
    }

    #[test]
    fn test_reconcile_ignores_stale_revision() {
        let mut p = player(&["a", "b", "c"], 2, 0);
        p.seek(1).unwrap();
        let stale = p.revision();
        p.seek(2).unwrap();

        assert!(p.reconcile(stale, 0).is_empty());
        assert_eq!(p.current_index(), 2);

        let effects = p.reconcile(p.revision(), 0);
        assert_eq!(announcements(&effects), vec!["a"]);
        assert_eq!(p.current_index(), 0);
    }

    #[test]
    fn test_late_seek_answer_does_not_undo_steps() {
        let mut p = player(&["a", "b", "c"], 2, 0);
        p.start().unwrap();
        p.pause(None);

        p.seek(1).unwrap();
        let sent = p.revision();
        p.step_forward();
        assert_eq!(p.current_index(), 2);

        assert!(p.reconcile(sent, 1).is_empty());
        assert_eq!(p.current_index(), 2);
        assert_eq!(p.remaining(), 2);
    }

    #[test]
    fn test_late_seek_answer_does_not_undo_advance() {
        let mut p = player(&["a", "b", "c"], 2, 0);
        p.start().unwrap();

        p.seek(0).unwrap();
        let sent = p.revision();
        p.tick();
        p.tick();
        p.advance();
        assert_eq!(p.current_index(), 1);
        assert_eq!(p.remaining(), 4);

        assert!(p.reconcile(sent, 0).is_empty());
        assert_eq!(p.current_index(), 1);
        assert_eq!(p.remaining(), 4);
    }

    #[test]
    fn test_completed_misuse_is_a_noop() {
        let mut p = player(&["a"], 1, 0);
        p.start().unwrap();
        p.tick();
        assert_eq!(p.state(), PlayerState::Completed);

        assert!(p.pause(Some("late".to_string())).is_empty());
        assert!(p.resume().is_empty());
        assert!(p.step_forward().is_empty());
        assert!(p.seek(0).unwrap().is_empty());
        assert_eq!(p.state(), PlayerState::Completed);
    }

    #[test]
    fn test_report_completion_lifecycle() {
        let mut p = player(&["a", "b"], 1, 0);
        assert!(matches!(
            p.report_completion(None),
            Err(PlayerError::InvalidState { .. })
        ));

        p.start().unwrap();
        p.advance();
        p.advance();
        assert_eq!(p.state(), PlayerState::Completed);
        assert_eq!(p.current_index(), 1);

        let effects = p.report_completion(None).unwrap();
        match &effects[..] {
            [PlayerEffect::Complete(request)] => {
                assert_eq!(request.note, COMPLETION_NOTE);
                assert_eq!(request.status, ProjectStatus::UnderReview);
            }
            other => panic!("Expected completion, got {:?}", other),
        }
        assert!(matches!(
            p.report_completion(None),
            Err(PlayerError::CompletionInFlight)
        ));

        // Failure keeps the data and allows a retry
        p.completion_failed();
        assert_eq!(p.current_index(), 1);
        assert_eq!(p.completion_status(), CompletionStatus::NotReported);

        p.report_completion(None).unwrap();
        p.completion_confirmed();
        assert_eq!(p.completion_status(), CompletionStatus::Reported);
        assert_eq!(p.current_index(), 0);
        assert!(p.report_completion(None).unwrap().is_empty());
    }

    #[test]
    fn test_window() {
        let mut p = player(&["1", "2", "3", "4"], 1, 0);
        assert_eq!(p.window(2), vec![None, None, Some("1"), Some("2"), Some("3")]);

        p.seek(3).unwrap();
        assert_eq!(p.window(1), vec![Some("3"), Some("4"), None]);
    }
}
