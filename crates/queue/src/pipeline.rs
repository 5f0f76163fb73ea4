//! Streaming ingestion of one file: fetch → stage → parse → batch → write.
//!
//! The pipeline runs to completion for exactly one job. Per-line parse
//! failures are recorded and skipped; source and sink errors abort the run
//! and surface as the job's failure cause. The fetched bytes are staged to
//! a temp file whose removal is tied to its handle, so cleanup happens on
//! every exit path.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::batcher::RecordBatcher;
use crate::error::QueueError;
use crate::job::{Job, LineError};
use crate::parser;
use crate::sink::DocumentSink;
use crate::source::FileSource;
use crate::store::JobStore;

/// Per-run settings, fixed at dispatcher construction.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Records accumulated before a bulk write.
    pub batch_size: usize,
    /// Target collection/table in the datastore.
    pub collection: String,
    /// Staging directory for fetched file contents.
    pub temp_dir: PathBuf,
}

/// Ingest one job's file end to end.
///
/// Progress, line counts, and per-line errors are written through the
/// store's hooks; the terminal transition is the caller's responsibility
/// (the dispatcher maps this function's result onto completed/failed).
pub async fn run(
    store: &JobStore,
    source: &dyn FileSource,
    sink: &dyn DocumentSink,
    settings: &PipelineSettings,
    job: &Job,
) -> Result<(), QueueError> {
    let data = source.fetch(&job.file_id).await?;

    // Stage to a temp file; the handle's drop removes it on every path out.
    tokio::fs::create_dir_all(&settings.temp_dir).await?;
    let staged = tempfile::NamedTempFile::new_in(&settings.temp_dir)?;
    tokio::fs::write(staged.path(), &data).await?;
    debug!(
        job_id = %job.job_id,
        file_id = %job.file_id,
        bytes = data.len(),
        staged = %staged.path().display(),
        "source staged for ingestion"
    );
    drop(data);

    let file = tokio::fs::File::open(staged.path()).await?;
    let mut lines = BufReader::new(file).lines();
    let mut batcher = RecordBatcher::new(settings.batch_size);
    let mut position: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        position += 1;

        if parser::is_blank(&line) {
            continue;
        }

        match parser::parse_line(&job.file_id, &job.file_name, &line, position) {
            Ok(record) => {
                batcher.push(record);
                if let Some(batch) = batcher.try_flush() {
                    let batch_len = batch.len();
                    sink.bulk_insert(&settings.collection, &batch).await?;
                    store.record_flush(job.job_id, batch_len, position);
                    debug!(
                        job_id = %job.job_id,
                        batch = batch_len,
                        lines_seen = position,
                        "batch flushed"
                    );
                }
            }
            Err(e) => {
                store.record_line_error(job.job_id, LineError::new(position, e.to_string(), &line));
            }
        }
    }

    // Drain whatever is left below the size threshold.
    let remainder = batcher.flush();
    if !remainder.is_empty() {
        let batch_len = remainder.len();
        sink.bulk_insert(&settings.collection, &remainder).await?;
        store.record_flush(job.job_id, batch_len, position);
    }

    Ok(())
}
