//! Source seam: where job input bytes come from.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use filepipe_storage::{FileStore, StorageError};

use crate::error::QueueError;

/// Trait for resolving a job's source file by fileId.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Fetch the full contents of the file.
    ///
    /// A missing file maps to [`QueueError::SourceNotFound`] and an
    /// authorization failure to [`QueueError::SourceAccessDenied`]; both
    /// are fatal to the job that requested them.
    async fn fetch(&self, file_id: &str) -> Result<Bytes, QueueError>;
}

/// Production source backed by the object store.
pub struct ObjectStoreSource {
    files: Arc<FileStore>,
}

impl ObjectStoreSource {
    pub fn new(files: Arc<FileStore>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl FileSource for ObjectStoreSource {
    async fn fetch(&self, file_id: &str) -> Result<Bytes, QueueError> {
        self.files.fetch(file_id).await.map_err(|e| match e {
            StorageError::NotFound(id) => QueueError::SourceNotFound(id),
            StorageError::AccessDenied(id) => QueueError::SourceAccessDenied(id),
            other => QueueError::Source(other.to_string()),
        })
    }
}
