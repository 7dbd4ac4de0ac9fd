//! Sync engine
//!
//! Owns the roster and keeps it aligned with the remote document:
//! one read on load, one queued write-back per mutation. Local state wins;
//! a failed write is reported but never rolled back.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::queue::{spawn_save_queue, QueueStatus, SaveEvent, SaveQueueHandle, Snapshot};
use crate::error::{SyncError, SyncResult};
use crate::models::{Ninja, NinjaDocument};
use crate::remote::DocumentStore;
use crate::roster::{validate_amount, Roster};

/// Outcome of the most recent load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No load has finished yet
    Loading,
    /// Roster reflects the remote document
    Loaded,
    /// Load failed; roster kept its previous contents
    Failed(String),
}

/// Keeps the roster and the remote document in step
pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    roster: Roster,
    load_state: LoadState,
    /// Bumped on every mutation
    generation: u64,
    /// Generation the roster was last known to match remotely via a load
    loaded_generation: u64,
    queue: SaveQueueHandle,
    events: Option<mpsc::UnboundedReceiver<SaveEvent>>,
}

impl SyncEngine {
    /// Create an engine with an empty roster
    ///
    /// Spawns the save queue, so this must run inside a tokio runtime.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (queue, events) = spawn_save_queue(store.clone());
        Self {
            store,
            roster: Roster::new(),
            load_state: LoadState::Loading,
            generation: 0,
            loaded_generation: 0,
            queue,
            events: Some(events),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ninjas(&self) -> &[Ninja] {
        self.roster.ninjas()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// True until the first load finishes, successfully or not
    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Number of mutations applied so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the latest local state has not been confirmed written
    pub fn has_unsaved_changes(&self) -> bool {
        let confirmed = self
            .queue
            .persisted_generation()
            .max(self.loaded_generation);
        self.generation > confirmed
    }

    /// Whether a write is in progress right now
    pub fn is_saving(&self) -> bool {
        self.queue.status() == QueueStatus::Saving
    }

    /// Take the save event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SaveEvent>> {
        self.events.take()
    }

    /// Read the latest remote document and replace the roster with it
    ///
    /// Queued writes are flushed first, so none of them can land on top of
    /// the document just read. On failure the roster is left untouched.
    /// Either way the engine stops reporting `is_loading()`.
    pub async fn load(&mut self) -> SyncResult<usize> {
        if let Err(e) = self.flush().await {
            debug!("Flush before load failed: {}", e);
        }

        match self.store.fetch_latest().await {
            Ok(document) => {
                let count = document.ninjas.len();
                self.roster.replace(document.ninjas);
                self.load_state = LoadState::Loaded;
                self.loaded_generation = self.generation;
                info!("Loaded {} ninjas", count);
                Ok(count)
            }
            Err(error) => {
                warn!("Failed to fetch ninjas: {}", error);
                self.load_state = LoadState::Failed(error.to_string());
                Err(SyncError::Load(error))
            }
        }
    }

    /// Overwrite the remote document with `ninjas` and wait for the result
    ///
    /// Bypasses the queue; mutations never call this.
    pub async fn save(&self, ninjas: &[Ninja]) -> SyncResult<()> {
        let document = NinjaDocument::new(ninjas.to_vec());
        self.store.overwrite(&document).await.map_err(|error| {
            warn!("Failed to save ninjas: {}", error);
            SyncError::Save(error)
        })?;
        info!("Saved {} ninjas", ninjas.len());
        Ok(())
    }

    /// Add `delta` to the balance at `index` and queue a write-back
    ///
    /// `delta` may be negative. An index outside the roster fails without
    /// touching anything.
    pub fn apply_balance_delta(&mut self, index: usize, delta: i64) -> SyncResult<i64> {
        let bucks = self.roster.apply_delta(index, delta)?;
        self.commit()?;
        Ok(bucks)
    }

    /// Give `amount` (> 0) bucks to the ninja at `index`
    pub fn add_bucks(&mut self, index: usize, amount: i64) -> SyncResult<i64> {
        let amount = validate_amount(amount)?;
        self.apply_balance_delta(index, amount)
    }

    /// Take `amount` (> 0) bucks from the ninja at `index`
    pub fn spend_bucks(&mut self, index: usize, amount: i64) -> SyncResult<i64> {
        let amount = validate_amount(amount)?;
        self.apply_balance_delta(index, -amount)
    }

    /// Append a new ninja and queue a write-back, returning its position
    pub fn append_entity(&mut self, name: &str, bucks: i64) -> SyncResult<usize> {
        let index = self.roster.append(name, bucks)?;
        self.commit()?;
        Ok(index)
    }

    /// Wait until every queued write has been handled
    pub async fn flush(&self) -> SyncResult<()> {
        if self.queue.flush().await {
            Ok(())
        } else {
            Err(SyncError::QueueClosed)
        }
    }

    /// Write pending changes and stop the save queue
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }

    /// Record a mutation and hand a snapshot to the save queue
    fn commit(&mut self) -> SyncResult<()> {
        self.generation += 1;
        let snapshot = Snapshot {
            generation: self.generation,
            ninjas: self.roster.snapshot(),
        };
        if self.queue.enqueue(snapshot) {
            Ok(())
        } else {
            Err(SyncError::QueueClosed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, ValidationError};
    use crate::remote::MemoryStore;
    use reqwest::StatusCode;

    fn kai_document() -> NinjaDocument {
        serde_json::from_str(r#"{"ninjas":[{"ninjaName":"KAI","ninjaBucks":10}]}"#).unwrap()
    }

    async fn loaded_engine(document: NinjaDocument) -> (SyncEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_document(document));
        let mut engine = SyncEngine::new(store.clone());
        engine.load().await.unwrap();
        (engine, store)
    }

    #[tokio::test]
    async fn test_new_engine_is_loading_and_empty() {
        let engine = SyncEngine::new(Arc::new(MemoryStore::new()));
        assert!(engine.is_loading());
        assert!(engine.roster().is_empty());
        assert!(!engine.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_load_replaces_roster_in_order() {
        let document = NinjaDocument::new(vec![
            Ninja::new("kai", 10),
            Ninja::new("jay", 3),
            Ninja::new("nya", 7),
        ]);
        let store = Arc::new(MemoryStore::with_document(document.clone()));
        let mut engine = SyncEngine::new(store);

        assert_eq!(engine.load().await.unwrap(), 3);
        assert!(!engine.is_loading());
        assert_eq!(engine.load_state(), &LoadState::Loaded);
        assert_eq!(engine.ninjas(), document.ninjas.as_slice());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_roster_and_clears_loading() {
        let store = Arc::new(MemoryStore::new());
        store.set_fetch_error(Some(RemoteError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "down".to_string(),
        }));
        let mut engine = SyncEngine::new(store);

        let err = engine.load().await.unwrap_err();
        assert!(matches!(err, SyncError::Load(RemoteError::Status { .. })));
        assert!(!engine.is_loading());
        assert!(engine.roster().is_empty());
        assert!(matches!(engine.load_state(), LoadState::Failed(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_roster() {
        let (mut engine, store) = loaded_engine(kai_document()).await;
        store.set_fetch_error(Some(RemoteError::Transport("offline".to_string())));

        assert!(engine.load().await.is_err());
        assert_eq!(engine.ninjas(), kai_document().ninjas.as_slice());
    }

    #[tokio::test]
    async fn test_balance_delta_writes_full_list() {
        let (mut engine, store) = loaded_engine(kai_document()).await;

        assert_eq!(engine.apply_balance_delta(0, 5).unwrap(), 15);
        assert_eq!(engine.ninjas(), &[Ninja::new("KAI", 15)]);

        engine.flush().await.unwrap();
        let expected: NinjaDocument =
            serde_json::from_str(r#"{"ninjas":[{"ninjaName":"KAI","ninjaBucks":15}]}"#).unwrap();
        assert_eq!(store.writes().last(), Some(&expected));
    }

    #[tokio::test]
    async fn test_add_then_spend_round_trip() {
        let (mut engine, _store) = loaded_engine(kai_document()).await;

        for amount in [1, 4, 250] {
            engine.add_bucks(0, amount).unwrap();
            engine.spend_bucks(0, amount).unwrap();
            assert_eq!(engine.ninjas()[0].bucks, 10);
        }
    }

    #[tokio::test]
    async fn test_spend_can_go_negative() {
        let (mut engine, _store) = loaded_engine(kai_document()).await;
        assert_eq!(engine.spend_bucks(0, 25).unwrap(), -15);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected_without_write() {
        let (mut engine, store) = loaded_engine(kai_document()).await;

        for amount in [0, -3] {
            let err = engine.add_bucks(0, amount).unwrap_err();
            assert_eq!(
                err,
                SyncError::Validation(ValidationError::NonPositiveAmount(amount))
            );
            assert!(engine.spend_bucks(0, amount).unwrap_err().is_validation());
        }

        engine.flush().await.unwrap();
        assert_eq!(engine.ninjas()[0].bucks, 10);
        assert_eq!(engine.generation(), 0);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_delta_out_of_range_fails_fast() {
        let (mut engine, store) = loaded_engine(kai_document()).await;

        assert_eq!(
            engine.apply_balance_delta(3, 1),
            Err(SyncError::IndexOutOfRange { index: 3, len: 1 })
        );
        engine.flush().await.unwrap();
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_append_entity() {
        let (mut engine, store) = loaded_engine(NinjaDocument::default()).await;

        assert_eq!(engine.append_entity("  ace  ", 0).unwrap(), 0);
        assert_eq!(engine.ninjas().last(), Some(&Ninja::new("ACE", 0)));

        let err = engine.append_entity("", 5).unwrap_err();
        assert_eq!(err, SyncError::Validation(ValidationError::EmptyName));
        let err = engine.append_entity("lloyd", -1).unwrap_err();
        assert_eq!(err, SyncError::Validation(ValidationError::NegativeBalance(-1)));
        assert_eq!(engine.roster().len(), 1);

        engine.flush().await.unwrap();
        assert_eq!(store.document().ninjas, vec![Ninja::new("ACE", 0)]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_state_and_reports_unsaved() {
        let (mut engine, store) = loaded_engine(kai_document()).await;
        let mut events = engine.take_events().unwrap();
        store.set_write_error(Some(RemoteError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        }));

        engine.add_bucks(0, 5).unwrap();
        engine.flush().await.unwrap();

        // No rollback
        assert_eq!(engine.ninjas()[0].bucks, 15);
        assert!(engine.has_unsaved_changes());
        assert!(matches!(
            events.recv().await,
            Some(SaveEvent::Failed { generation: 1, error }) if error.is_unauthorized()
        ));
        assert_eq!(store.document(), kai_document());

        store.set_write_error(None);
        engine.add_bucks(0, 1).unwrap();
        engine.flush().await.unwrap();
        assert!(!engine.has_unsaved_changes());
        assert_eq!(store.document().ninjas[0].bucks, 16);
    }

    #[tokio::test]
    async fn test_rapid_mutations_land_in_order() {
        let (mut engine, store) = loaded_engine(kai_document()).await;

        let gate = store.hold_writes().await;
        engine.add_bucks(0, 1).unwrap();
        tokio::task::yield_now().await;
        engine.add_bucks(0, 2).unwrap();
        engine.append_entity("zane", 4).unwrap();
        drop(gate);
        engine.flush().await.unwrap();

        assert_eq!(store.max_concurrent_writes(), 1);
        assert_eq!(
            store.document().ninjas,
            vec![Ninja::new("KAI", 13), Ninja::new("ZANE", 4)]
        );
    }

    #[tokio::test]
    async fn test_save_reports_errors() {
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::new(store.clone());
        let ninjas = vec![Ninja::new("cole", 2)];

        engine.save(&ninjas).await.unwrap();
        assert_eq!(store.document().ninjas, ninjas);

        store.set_write_error(Some(RemoteError::Transport("offline".to_string())));
        let err = engine.save(&ninjas).await.unwrap_err();
        assert!(matches!(err, SyncError::Save(RemoteError::Transport(_))));
    }

    #[tokio::test]
    async fn test_load_writes_queued_snapshots_first() {
        let (mut engine, store) = loaded_engine(kai_document()).await;

        engine.add_bucks(0, 5).unwrap();
        assert_eq!(engine.load().await.unwrap(), 1);

        assert_eq!(engine.ninjas()[0].bucks, 15);
        assert!(!engine.has_unsaved_changes());

        // Nothing older is left to overwrite what was just read
        engine.flush().await.unwrap();
        assert_eq!(store.writes().len(), 1);
        assert_eq!(store.document().ninjas[0].bucks, 15);
    }

    #[tokio::test]
    async fn test_reload_clears_unsaved_flag() {
        let (mut engine, store) = loaded_engine(kai_document()).await;
        store.set_write_error(Some(RemoteError::Transport("offline".to_string())));
        engine.add_bucks(0, 5).unwrap();
        engine.flush().await.unwrap();
        assert!(engine.has_unsaved_changes());

        store.set_write_error(None);
        engine.load().await.unwrap();
        assert!(!engine.has_unsaved_changes());
        assert_eq!(engine.ninjas()[0].bucks, 10);
    }
}
