//! Bounded-concurrency dispatch of queued jobs onto worker tasks.
//!
//! [`Dispatcher::notify`] is the single drain point: it claims queued jobs
//! while worker slots are free and spawns one pipeline task per claim.
//! Every task re-notifies on completion, so the queue keeps draining
//! without recursive calls: the drain is an explicit loop bounded by the
//! concurrency ceiling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::job::Job;
use crate::pipeline::{self, PipelineSettings};
use crate::sink::DocumentSink;
use crate::source::FileSource;
use crate::store::JobStore;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Hard ceiling on simultaneously running pipelines.
    pub max_concurrent_jobs: usize,
    /// Records accumulated before a bulk write.
    pub batch_size: usize,
    /// Target collection/table in the datastore.
    pub collection: String,
    /// Staging directory for fetched file contents.
    pub temp_dir: PathBuf,
}

/// Cheap-to-clone handle; clones share the same store and worker slots.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<JobStore>,
    source: Arc<dyn FileSource>,
    sink: Arc<dyn DocumentSink>,
    max_concurrent_jobs: usize,
    settings: PipelineSettings,
}

impl Dispatcher {
    pub fn new(
        store: Arc<JobStore>,
        source: Arc<dyn FileSource>,
        sink: Arc<dyn DocumentSink>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                sink,
                max_concurrent_jobs: config.max_concurrent_jobs.max(1),
                settings: PipelineSettings {
                    batch_size: config.batch_size.max(1),
                    collection: config.collection,
                    temp_dir: config.temp_dir,
                },
            }),
        }
    }

    /// The job registry (status reads go straight to it).
    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    /// Submit a new ingestion job and attempt a dispatch.
    pub fn submit(&self, file_id: &str, file_name: &str) -> Job {
        let job = self.inner.store.submit(file_id, file_name);
        info!(
            job_id = %job.job_id,
            file_id = %file_id,
            file_name = %file_name,
            "ingestion job submitted"
        );
        self.notify();
        job
    }

    /// Claim and start queued jobs while worker slots are free.
    ///
    /// Idempotent and callable from anywhere: submission, task completion,
    /// startup recovery. A no-op when the ceiling is reached or the queue
    /// is empty.
    pub fn notify(&self) {
        while let Some(job) = self
            .inner
            .store
            .claim_next(self.inner.max_concurrent_jobs)
        {
            info!(
                job_id = %job.job_id,
                file_id = %job.file_id,
                "ingestion job dispatched"
            );
            let this = self.clone();
            tokio::spawn(async move {
                this.run_job(job).await;
            });
        }
    }

    /// Run one pipeline to completion and record the terminal state.
    async fn run_job(self, job: Job) {
        let start = Instant::now();
        let result = pipeline::run(
            &self.inner.store,
            self.inner.source.as_ref(),
            self.inner.sink.as_ref(),
            &self.inner.settings,
            &job,
        )
        .await;

        let job_id = job.job_id;
        match self.inner.store.finish(job_id, result) {
            Ok(finished) if finished.status == crate::job::JobStatus::Completed => {
                info!(
                    job_id = %job_id,
                    file_id = %finished.file_id,
                    lines = finished.lines_processed,
                    line_errors = finished.errors.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "ingestion job completed"
                );
            }
            Ok(finished) => {
                error!(
                    job_id = %job_id,
                    file_id = %finished.file_id,
                    error = finished.error_message.as_deref().unwrap_or("unknown"),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "ingestion job failed"
                );
            }
            Err(e) => {
                error!(job_id = %job_id, "failed to record job outcome: {}", e);
            }
        }

        // Free slot — see if more work is queued.
        self.notify();
    }
}
