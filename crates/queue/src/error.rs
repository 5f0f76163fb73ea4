//! Job queue error types.

use thiserror::Error;
use uuid::Uuid;

use crate::job::JobStatus;
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: JobStatus, to: JobStatus },

    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("access denied to source file: {0}")]
    SourceAccessDenied(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("line parse error: {0}")]
    Parse(String),

    #[error("datastore write error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
