// Session driver - single event loop owning a SequencePlayer
//
// Host commands, settled store calls and the two countdowns are polled by one
// `select!`, so player operations never interleave. Store calls run as
// spawned tasks and report back through an internal channel.

use crate::config::AppConfig;
use crate::connection::AtomicStoreStatus;
use crate::messaging::{Notification, NotificationCategory, NotificationSender};
use crate::project::{Project, SessionContext};
use crate::sequencer::{
    CompletionStatus, PlayerEffect, PlayerError, SequenceDescriptor, SequencePlayer, pause_label,
};
use crate::session::handle::{CommandReply, PlayerCommand, SessionHandle};
use crate::session::snapshot::PlaybackSnapshot;
use crate::speech::Announcer;
use crate::store::{ProgressStore, StoreError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, interval_at};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Report completion (without proof) as soon as the sequence finishes
    pub auto_report_completion: bool,
    pub command_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_report_completion: false,
            command_capacity: 32,
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            auto_report_completion: config.auto_report_completion,
            ..Self::default()
        }
    }
}

/// Outcome of a spawned store call
enum Settled {
    Checkpoint(Result<(), StoreError>),
    Seek {
        revision: u64,
        result: Result<Project, StoreError>,
    },
    Completion(Result<(), StoreError>),
}

pub struct PlayerSession<S: ProgressStore, A: Announcer> {
    context: SessionContext,
    player: SequencePlayer,
    store: S,
    announcer: A,
    options: SessionOptions,
    store_status: AtomicStoreStatus,
    notifications: NotificationSender,
    cmd_rx: mpsc::Receiver<(PlayerCommand, CommandReply)>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
    snapshots: watch::Sender<PlaybackSnapshot>,
    tick: Option<Interval>,
    advance: Option<Interval>,
    completion_reply: Option<CommandReply>,
}

impl<S: ProgressStore, A: Announcer> PlayerSession<S, A> {
    pub fn new(
        context: SessionContext,
        descriptor: SequenceDescriptor,
        store: S,
        announcer: A,
        notifications: NotificationSender,
        options: SessionOptions,
    ) -> (Self, SessionHandle) {
        let player = SequencePlayer::new(descriptor);
        let store_status = AtomicStoreStatus::default();

        let (cmd_tx, cmd_rx) = mpsc::channel(options.command_capacity.max(1));
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) =
            watch::channel(PlaybackSnapshot::capture(&player, store_status.get()));

        let handle = SessionHandle::new(cmd_tx, snapshot_rx, store_status.clone());
        let session = Self {
            context,
            player,
            store,
            announcer,
            options,
            store_status,
            notifications,
            cmd_rx,
            settled_tx,
            settled_rx,
            snapshots,
            tick: None,
            advance: None,
            completion_reply: None,
        };

        (session, handle)
    }

    /// Start the player and run until shutdown or until every handle is dropped
    ///
    /// Returns the start error when the descriptor is invalid.
    pub async fn run(mut self) -> Result<(), PlayerError> {
        tracing::info!(
            session = %self.context.session_id,
            project = %self.context.project_id,
            values = self.player.descriptor().len(),
            interval = self.player.descriptor().interval_seconds,
            "session starting"
        );

        match self.player.start() {
            Ok(effects) => self.execute(effects),
            Err(e) => {
                tracing::error!(error = %e, "session failed to start");
                self.notify(Notification::error(
                    NotificationCategory::Config,
                    e.to_string(),
                ));
                self.publish();
                return Err(e);
            }
        }
        self.publish();

        let mut shutdown_reply = None;
        loop {
            tokio::select! {
                biased;

                command = self.cmd_rx.recv() => match command {
                    Some((PlayerCommand::Shutdown, reply)) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    Some((command, reply)) => self.handle_command(command, reply),
                    None => break,
                },

                Some(settled) = self.settled_rx.recv() => self.settle(settled),

                _ = next_fire(&mut self.advance) => {
                    let effects = self.player.advance();
                    self.execute(effects);
                }

                _ = next_fire(&mut self.tick) => {
                    let effects = self.player.tick();
                    self.execute(effects);
                }
            }

            self.publish();
        }

        self.disarm();
        self.announcer.cancel();
        self.publish();
        tracing::info!(
            session = %self.context.session_id,
            state = %self.player.state(),
            index = self.player.current_index(),
            "session stopped"
        );

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(Ok(()));
        }
        Ok(())
    }

    fn handle_command(&mut self, command: PlayerCommand, reply: CommandReply) {
        tracing::debug!(?command, state = %self.player.state(), "command");

        let effects = match command {
            PlayerCommand::Pause(note) => self.player.pause(note),
            PlayerCommand::Annotate(note) => self.player.annotate(note),
            PlayerCommand::Resume => self.player.resume(),
            PlayerCommand::StepBack => self.player.step_back(),
            PlayerCommand::StepForward => self.player.step_forward(),
            PlayerCommand::Seek(index) => match self.player.seek(index) {
                Ok(effects) => effects,
                Err(e) => {
                    let _ = reply.send(Err(e));
                    return;
                }
            },
            PlayerCommand::ReportCompletion(proof) => {
                match self.player.report_completion(proof) {
                    // Already reported
                    Ok(effects) if effects.is_empty() => Vec::new(),
                    Ok(effects) => {
                        self.completion_reply = Some(reply);
                        self.execute(effects);
                        return;
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return;
                    }
                }
            }
            // Handled by the loop
            PlayerCommand::Shutdown => Vec::new(),
        };

        self.execute(effects);
        let _ = reply.send(Ok(()));
    }

    fn execute(&mut self, effects: Vec<PlayerEffect>) {
        for effect in effects {
            match effect {
                PlayerEffect::Announce(value) => self.announcer.replace(&value),
                PlayerEffect::ArmCountdowns {
                    first_advance_in,
                    interval,
                } => self.arm(first_advance_in, interval),
                PlayerEffect::DisarmCountdowns => self.disarm(),
                PlayerEffect::Checkpoint(mut request) => {
                    request.paused_at = Some(pause_label(&chrono::Local::now()));
                    let store = self.store.clone();
                    let project_id = self.context.project_id.clone();
                    self.spawn_call(async move {
                        Settled::Checkpoint(store.checkpoint(&project_id, &request).await)
                    });
                }
                PlayerEffect::SeekUpdate(request) => {
                    let store = self.store.clone();
                    let project_id = self.context.project_id.clone();
                    self.spawn_call(async move {
                        let result = store.seek_update(&project_id, &request).await;
                        Settled::Seek {
                            revision: request.revision,
                            result,
                        }
                    });
                }
                PlayerEffect::Complete(mut request) => {
                    request.paused_at = Some(pause_label(&chrono::Local::now()));
                    let store = self.store.clone();
                    let project_id = self.context.project_id.clone();
                    self.spawn_call(async move {
                        Settled::Completion(store.complete(&project_id, &request).await)
                    });
                }
                PlayerEffect::Finished => self.on_finished(),
            }
        }
    }

    fn on_finished(&mut self) {
        tracing::info!(
            elapsed = self.player.elapsed(),
            advances = self.player.playback().advances,
            "sequence completed"
        );
        self.notify(Notification::info(
            NotificationCategory::Playback,
            "Sequence completed".to_string(),
        ));

        if self.options.auto_report_completion
            && self.player.completion_status() == CompletionStatus::NotReported
        {
            match self.player.report_completion(None) {
                Ok(effects) => self.execute(effects),
                Err(e) => tracing::warn!(error = %e, "automatic completion report skipped"),
            }
        }
    }

    fn settle(&mut self, settled: Settled) {
        match settled {
            Settled::Checkpoint(result) => {
                self.record(&result);
                match result {
                    Ok(()) => self.notify(Notification::info(
                        NotificationCategory::Checkpoint,
                        "Pause saved".to_string(),
                    )),
                    Err(e) => {
                        tracing::warn!(error = %e, "checkpoint failed");
                        self.notify(Notification::error(
                            NotificationCategory::Checkpoint,
                            format!("Failed to save pause: {}", e),
                        ));
                    }
                }
            }
            Settled::Seek { revision, result } => {
                self.record(&result);
                match result {
                    Ok(project) => {
                        let effects = self
                            .player
                            .reconcile(revision, project.current_state as usize);
                        self.execute(effects);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, revision, "seek update failed");
                        self.notify(Notification::error(
                            NotificationCategory::Seek,
                            format!("Failed to save position: {}", e),
                        ));
                    }
                }
            }
            Settled::Completion(result) => {
                self.record(&result);
                let reply = self.completion_reply.take();
                match result {
                    Ok(()) => {
                        self.player.completion_confirmed();
                        self.notify(Notification::info(
                            NotificationCategory::Completion,
                            "Task submitted for review".to_string(),
                        ));
                        if let Some(reply) = reply {
                            let _ = reply.send(Ok(()));
                        }
                    }
                    Err(e) => {
                        self.player.completion_failed();
                        tracing::warn!(error = %e, "completion report failed");
                        self.notify(Notification::error(
                            NotificationCategory::Completion,
                            format!("Failed to submit the task, please retry: {}", e),
                        ));
                        if let Some(reply) = reply {
                            let _ = reply.send(Err(PlayerError::Completion(e)));
                        }
                    }
                }
            }
        }
    }

    fn arm(&mut self, first_advance_in: Duration, interval: Duration) {
        let now = Instant::now();
        self.tick = Some(interval_at(now + TICK, TICK));
        self.advance = Some(interval_at(now + first_advance_in, interval));
    }

    fn disarm(&mut self) {
        self.tick = None;
        self.advance = None;
    }

    fn spawn_call<F>(&self, call: F)
    where
        F: std::future::Future<Output = Settled> + Send + 'static,
    {
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            // The loop may be gone; the result no longer matters then
            let _ = settled_tx.send(call.await);
        });
    }

    fn record<T>(&self, result: &Result<T, StoreError>) {
        let previous = self.store_status.record(result);
        let current = self.store_status.get();
        if previous != current {
            tracing::info!(%previous, %current, "store status changed");
        }
    }

    fn notify(&self, notification: Notification) {
        self.notifications.send(notification);
    }

    fn publish(&self) {
        self.snapshots.send_replace(PlaybackSnapshot::capture(
            &self.player,
            self.store_status.get(),
        ));
    }
}

/// Wait for the next firing of an armed countdown; never resolves when disarmed
async fn next_fire(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
