//! In-process document store
//!
//! Behaves like the hosted bin (whole-document read and overwrite) and
//! records every write, with knobs to inject failures and to hold writes
//! in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::DocumentStore;
use crate::error::RemoteError;
use crate::models::NinjaDocument;

#[derive(Debug, Default)]
struct Inner {
    document: NinjaDocument,
    writes: Vec<NinjaDocument>,
    fetch_error: Option<RemoteError>,
    write_error: Option<RemoteError>,
    fetch_count: usize,
}

/// Document store backed by memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    write_gate: Arc<tokio::sync::Mutex<()>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `document`
    pub fn with_document(document: NinjaDocument) -> Self {
        let store = Self::default();
        store.lock().document = document;
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current stored document
    pub fn document(&self) -> NinjaDocument {
        self.lock().document.clone()
    }

    /// Every document written so far, oldest first
    pub fn writes(&self) -> Vec<NinjaDocument> {
        self.lock().writes.clone()
    }

    /// Number of reads served (including failed ones)
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    /// Make reads fail with `error` until cleared with `None`
    pub fn set_fetch_error(&self, error: Option<RemoteError>) {
        self.lock().fetch_error = error;
    }

    /// Make writes fail with `error` until cleared with `None`
    pub fn set_write_error(&self, error: Option<RemoteError>) {
        self.lock().write_error = error;
    }

    /// Block writes until the returned guard is dropped
    pub async fn hold_writes(&self) -> OwnedMutexGuard<()> {
        self.write_gate.clone().lock_owned().await
    }

    /// Highest number of writes that were ever in progress at once
    pub fn max_concurrent_writes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_latest(&self) -> Result<NinjaDocument, RemoteError> {
        let mut inner = self.lock();
        inner.fetch_count += 1;
        match inner.fetch_error {
            Some(ref error) => Err(error.clone()),
            None => Ok(inner.document.clone()),
        }
    }

    async fn overwrite(&self, document: &NinjaDocument) -> Result<(), RemoteError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let _gate = self.write_gate.lock().await;

        let result = {
            let mut inner = self.lock();
            match inner.write_error {
                Some(ref error) => Err(error.clone()),
                None => {
                    inner.document = document.clone();
                    inner.writes.push(document.clone());
                    Ok(())
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
