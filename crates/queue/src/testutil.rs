//! In-memory doubles for the source and sink seams, shared across the
//! store, pipeline, and dispatcher tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;

use filepipe_core::Record;

use crate::error::QueueError;
use crate::persist::SnapshotStore;
use crate::sink::{DocumentSink, SinkError};
use crate::source::FileSource;
use crate::store::JobStore;

/// Fresh store backed by a scratch snapshot file.
pub(crate) fn open_store() -> (JobStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = JobStore::open(SnapshotStore::new(tmp.path().join("job-state.json")));
    (store, tmp)
}

/// Source double serving canned file contents.
///
/// An optional semaphore gate lets tests hold fetches open to observe
/// in-flight concurrency; each fetch consumes one permit.
#[derive(Default)]
pub(crate) struct MemorySource {
    files: HashMap<String, Bytes>,
    denied: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_id: &str, content: &str) -> Self {
        self.files
            .insert(file_id.to_string(), Bytes::from(content.to_string()));
        self
    }

    pub fn with_denied(mut self, file_id: &str) -> Self {
        self.denied.insert(file_id.to_string());
        self
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl FileSource for MemorySource {
    async fn fetch(&self, file_id: &str) -> Result<Bytes, QueueError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.denied.contains(file_id) {
            return Err(QueueError::SourceAccessDenied(file_id.to_string()));
        }
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| QueueError::SourceNotFound(file_id.to_string()))
    }
}

/// Sink double capturing inserted records and batch boundaries.
#[derive(Default)]
pub(crate) struct MemorySink {
    records: Mutex<Vec<Record>>,
    batch_sizes: Mutex<Vec<usize>>,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every bulk insert fails.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::Relaxed);
        sink
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    /// Distinct fileIds in first-insert order — the observable dispatch order.
    pub fn file_order(&self) -> Vec<String> {
        let records = self.records.lock().unwrap();
        let mut seen = Vec::new();
        for record in records.iter() {
            if !seen.contains(&record.file_id) {
                seen.push(record.file_id.clone());
            }
        }
        seen
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn bulk_insert(&self, _collection: &str, records: &[Record]) -> Result<(), SinkError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(SinkError::BulkInsert("simulated bulk write failure".into()));
        }
        self.batch_sizes.lock().unwrap().push(records.len());
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }
}
