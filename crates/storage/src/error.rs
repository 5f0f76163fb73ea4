use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("object store error: {0}")]
    ObjectStore(object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("{0}")]
    Other(String),
}
