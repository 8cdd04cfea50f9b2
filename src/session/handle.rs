// Session handle - host side of a running session

use crate::connection::{AtomicStoreStatus, StoreStatus};
use crate::sequencer::{PlayerError, ProofImage};
use crate::session::snapshot::PlaybackSnapshot;
use tokio::sync::{mpsc, oneshot, watch};

/// Reply to a command, sent once the session has applied it
pub type CommandReply = oneshot::Sender<Result<(), PlayerError>>;

/// Commands accepted by the session loop
#[derive(Debug)]
pub enum PlayerCommand {
    Pause(Option<String>),
    Annotate(String),
    Resume,
    StepBack,
    StepForward,
    Seek(usize),
    /// Answered once the store has settled the report
    ReportCompletion(Option<ProofImage>),
    Shutdown,
}

/// Cloneable handle to a [`PlayerSession`](crate::session::PlayerSession)
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<(PlayerCommand, CommandReply)>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    store_status: AtomicStoreStatus,
}

impl SessionHandle {
    pub(crate) fn new(
        cmd_tx: mpsc::Sender<(PlayerCommand, CommandReply)>,
        snapshots: watch::Receiver<PlaybackSnapshot>,
        store_status: AtomicStoreStatus,
    ) -> Self {
        Self {
            cmd_tx,
            snapshots,
            store_status,
        }
    }

    /// Send a command and wait until the session has applied it
    pub async fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send((command, reply_tx))
            .await
            .map_err(|_| PlayerError::SessionClosed)?;

        reply_rx.await.map_err(|_| PlayerError::SessionClosed)?
    }

    /// Pause, optionally with a note
    pub async fn pause(&self, note: Option<String>) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Pause(note)).await
    }

    /// Attach a note to the current pause
    pub async fn annotate(&self, note: impl Into<String>) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Annotate(note.into())).await
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Resume).await
    }

    pub async fn step_back(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::StepBack).await
    }

    pub async fn step_forward(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::StepForward).await
    }

    /// Jump to `index`; out of range indexes are rejected
    pub async fn seek(&self, index: usize) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Seek(index)).await
    }

    /// Report completion and wait for the store's answer
    ///
    /// A failure leaves the session completed so the report can be retried.
    pub async fn report_completion(&self, proof: Option<ProofImage>) -> Result<(), PlayerError> {
        self.send(PlayerCommand::ReportCompletion(proof)).await
    }

    /// Stop the session loop
    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&PlaybackSnapshot) -> bool,
    ) -> Result<PlaybackSnapshot, PlayerError> {
        self.snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| PlayerError::SessionClosed)
    }

    pub fn store_status(&self) -> StoreStatus {
        self.store_status.get()
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }
}
