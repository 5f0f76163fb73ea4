//! Datastore seam: where parsed records end up.

use async_trait::async_trait;
use thiserror::Error;

use filepipe_core::Record;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("datastore not configured: {0}")]
    NotConfigured(String),

    #[error("bulk insert failed: {0}")]
    BulkInsert(String),
}

/// Trait for document datastore backends.
///
/// A bulk insert is unordered within the batch, and partial success is not
/// modeled: any error fails the whole batch, which in turn fails the job
/// that produced it.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Write a batch of records to the named collection.
    async fn bulk_insert(&self, collection: &str, records: &[Record]) -> Result<(), SinkError>;
}
