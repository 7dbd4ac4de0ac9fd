//! Single-writer save queue
//!
//! Every roster mutation hands an owned snapshot to a background task. The
//! task runs one write at a time; snapshots that pile up while a write is
//! in flight are coalesced so only the newest one is sent. Writes can no
//! longer race each other, and an older snapshot can never land after a
//! newer one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::RemoteError;
use crate::models::{Ninja, NinjaDocument};
use crate::remote::DocumentStore;

/// Roster contents at a given mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Mutation counter at the time of the snapshot
    pub generation: u64,
    pub ninjas: Vec<Ninja>,
}

/// Commands sent to the save task
#[derive(Debug)]
pub enum SaveCommand {
    /// Persist this snapshot (or a newer one)
    Save(Snapshot),
    /// Reply once everything queued before this is written or superseded
    Flush(oneshot::Sender<()>),
    /// Finish pending work and stop
    Shutdown,
}

/// Events emitted by the save task
#[derive(Debug, Clone)]
pub enum SaveEvent {
    /// Snapshot written to the store
    Saved {
        generation: u64,
        at: DateTime<Utc>,
    },
    /// Write failed; local state is kept as-is
    Failed {
        generation: u64,
        error: RemoteError,
    },
}

/// What the save task is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Nothing in flight
    Idle,
    /// A write is in progress
    Saving,
}

/// Handle to control the save task
pub struct SaveQueueHandle {
    command_tx: mpsc::UnboundedSender<SaveCommand>,
    persisted_rx: watch::Receiver<u64>,
    status_rx: watch::Receiver<QueueStatus>,
    task: JoinHandle<()>,
}

impl SaveQueueHandle {
    /// Queue a snapshot without waiting for the write
    pub fn enqueue(&self, snapshot: Snapshot) -> bool {
        self.command_tx.send(SaveCommand::Save(snapshot)).is_ok()
    }

    /// Wait until everything queued so far has been handled
    ///
    /// Returns `false` if the task is gone.
    pub async fn flush(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.command_tx.send(SaveCommand::Flush(tx)).is_err() {
            return false;
        }
        rx.await.is_ok()
    }

    /// Highest generation known to be written
    pub fn persisted_generation(&self) -> u64 {
        *self.persisted_rx.borrow()
    }

    /// Current status of the task
    pub fn status(&self) -> QueueStatus {
        *self.status_rx.borrow()
    }

    /// Stop the task after it has written whatever is pending
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(SaveCommand::Shutdown);
        let _ = self.task.await;
    }
}

/// Spawn the save task
///
/// Must be called from within a tokio runtime.
pub fn spawn_save_queue(
    store: Arc<dyn DocumentStore>,
) -> (SaveQueueHandle, mpsc::UnboundedReceiver<SaveEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (persisted_tx, persisted_rx) = watch::channel(0);
    let (status_tx, status_rx) = watch::channel(QueueStatus::Idle);

    let task = tokio::spawn(save_loop(
        store,
        command_rx,
        event_tx,
        persisted_tx,
        status_tx,
    ));

    let handle = SaveQueueHandle {
        command_tx,
        persisted_rx,
        status_rx,
        task,
    };
    (handle, event_rx)
}

/// Commands drained in one wake-up
#[derive(Default)]
struct Batch {
    latest: Option<Snapshot>,
    superseded: usize,
    flush_waiters: Vec<oneshot::Sender<()>>,
    shutdown: bool,
}

impl Batch {
    fn absorb(&mut self, command: SaveCommand) {
        match command {
            SaveCommand::Save(snapshot) => {
                if self.latest.replace(snapshot).is_some() {
                    self.superseded += 1;
                }
            }
            SaveCommand::Flush(waiter) => self.flush_waiters.push(waiter),
            SaveCommand::Shutdown => self.shutdown = true,
        }
    }
}

/// Main loop: drain, coalesce, write, acknowledge
async fn save_loop(
    store: Arc<dyn DocumentStore>,
    mut command_rx: mpsc::UnboundedReceiver<SaveCommand>,
    event_tx: mpsc::UnboundedSender<SaveEvent>,
    persisted_tx: watch::Sender<u64>,
    status_tx: watch::Sender<QueueStatus>,
) {
    while let Some(command) = command_rx.recv().await {
        let mut batch = Batch::default();
        batch.absorb(command);
        while let Ok(command) = command_rx.try_recv() {
            batch.absorb(command);
        }

        if let Some(snapshot) = batch.latest {
            if batch.superseded > 0 {
                debug!(
                    "Coalesced {} queued snapshots into generation {}",
                    batch.superseded, snapshot.generation
                );
            }

            let _ = status_tx.send(QueueStatus::Saving);
            let event = write_snapshot(store.as_ref(), snapshot).await;
            if let SaveEvent::Saved { generation, .. } = event {
                persisted_tx.send_modify(|persisted| *persisted = (*persisted).max(generation));
            }
            let _ = event_tx.send(event);
            let _ = status_tx.send(QueueStatus::Idle);
        }

        for waiter in batch.flush_waiters {
            let _ = waiter.send(());
        }

        if batch.shutdown {
            debug!("Save queue shutting down");
            break;
        }
    }
}

async fn write_snapshot(store: &dyn DocumentStore, snapshot: Snapshot) -> SaveEvent {
    let Snapshot { generation, ninjas } = snapshot;
    let count = ninjas.len();

    match store.overwrite(&NinjaDocument::new(ninjas)).await {
        Ok(()) => {
            info!("Saved {} ninjas (generation {})", count, generation);
            SaveEvent::Saved {
                generation,
                at: Utc::now(),
            }
        }
        Err(error) => {
            warn!("Save of generation {} failed: {}", generation, error);
            SaveEvent::Failed { generation, error }
        }
    }
}
