//! Uploaded-file access on top of [`StorageBackend`].
//!
//! Files are keyed by their opaque fileId under an `uploads/` prefix.
//! NotFound and permission errors from the backend are mapped to typed
//! variants so callers can distinguish a missing file from a broken store.

use bytes::Bytes;
use tracing::info;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Store and fetch uploaded files by fileId.
pub struct FileStore {
    backend: StorageBackend,
}

impl FileStore {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }

    /// Object key for a fileId, honoring the backend's configured prefix.
    fn key(&self, file_id: &str) -> object_store::path::Path {
        let prefix = self.backend.prefix();
        let key = if prefix.is_empty() {
            format!("uploads/{}", file_id)
        } else {
            format!("{}/uploads/{}", prefix, file_id)
        };
        object_store::path::Path::from(key.as_str())
    }

    /// Upload file bytes under the given fileId.
    pub async fn put(&self, file_id: &str, data: Bytes) -> Result<(), StorageError> {
        let path = self.key(file_id);
        let size = data.len();
        self.backend
            .store()
            .put(&path, data.into())
            .await
            .map_err(|e| map_err(e, file_id))?;
        info!(file_id = %file_id, bytes = size, "file stored");
        Ok(())
    }

    /// Fetch the full contents of a previously-uploaded file.
    pub async fn fetch(&self, file_id: &str) -> Result<Bytes, StorageError> {
        let path = self.key(file_id);
        let result = self
            .backend
            .store()
            .get(&path)
            .await
            .map_err(|e| map_err(e, file_id))?;
        let data = result.bytes().await.map_err(|e| map_err(e, file_id))?;
        info!(file_id = %file_id, bytes = data.len(), "file fetched");
        Ok(data)
    }

    /// Whether a file exists (head request, no body transfer).
    pub async fn exists(&self, file_id: &str) -> Result<bool, StorageError> {
        let path = self.key(file_id);
        match self.backend.store().head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(map_err(e, file_id)),
        }
    }
}

/// Map object_store errors onto the typed variants callers branch on.
fn map_err(e: object_store::Error, file_id: &str) -> StorageError {
    match e {
        object_store::Error::NotFound { .. } => StorageError::NotFound(file_id.to_string()),
        object_store::Error::PermissionDenied { .. } | object_store::Error::Unauthenticated { .. } => {
            StorageError::AccessDenied(file_id.to_string())
        }
        other => StorageError::ObjectStore(other),
    }
}
