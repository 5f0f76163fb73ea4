pub mod batcher;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod parser;
pub mod persist;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use batcher::RecordBatcher;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::QueueError;
pub use job::{Job, JobStatus, LineError};
pub use persist::{Snapshot, SnapshotStore};
pub use sink::{DocumentSink, SinkError};
pub use source::{FileSource, ObjectStoreSource};
pub use store::JobStore;
