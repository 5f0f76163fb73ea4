//! Authoritative job registry and pending queue.
//!
//! All job-table mutation funnels through this store: submissions, claim
//! transitions, progress updates from the pipeline, and terminal
//! transitions. The table, the FIFO pending queue, and the active-worker
//! count live behind one lock so a claim check and its queue pop are a
//! single atomic step. The lock is never held across an await point.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::warn;
use uuid::Uuid;

use crate::error::QueueError;
use crate::job::{Job, JobStatus, LineError};
use crate::persist::{Snapshot, SnapshotStore};

/// Total-line estimate used for progress while the true count is unknown.
/// Streaming never sees the full file in advance, so progress is computed
/// against this assumed total and capped at 99 until completion forces 100.
const ASSUMED_TOTAL_LINES: u64 = 100_000;

struct Registry {
    jobs: IndexMap<Uuid, Job>,
    pending: VecDeque<Uuid>,
    active: usize,
}

/// Owns every [`Job`] plus the pending queue, snapshotting after each
/// state-affecting mutation.
pub struct JobStore {
    registry: RwLock<Registry>,
    snapshots: SnapshotStore,
}

impl JobStore {
    /// Open the store, restoring and reconciling any persisted snapshot.
    pub fn open(snapshots: SnapshotStore) -> Self {
        let restored = snapshots.load();
        let registry = Registry {
            jobs: restored.jobs.into_iter().map(|j| (j.job_id, j)).collect(),
            pending: restored.pending.into_iter().collect(),
            active: 0,
        };
        let store = Self {
            registry: RwLock::new(registry),
            snapshots,
        };
        // Write back the reconciled state so a crash before the next
        // mutation does not resurrect `processing` entries.
        {
            let registry = store.registry.read().unwrap();
            if !registry.jobs.is_empty() {
                store.persist(&registry);
            }
        }
        store
    }

    /// Create a job in `queued` state and append it to the pending queue.
    ///
    /// No file existence check happens here — the pipeline verifies the
    /// fileId against the object store when the job is dispatched.
    pub fn submit(&self, file_id: &str, file_name: &str) -> Job {
        let job = Job::new(file_id, file_name);
        let mut registry = self.registry.write().unwrap();
        registry.pending.push_back(job.job_id);
        registry.jobs.insert(job.job_id, job.clone());
        self.persist(&registry);
        job
    }

    /// Look up a job by id.
    pub fn get(&self, job_id: Uuid) -> Result<Job, QueueError> {
        let registry = self.registry.read().unwrap();
        registry
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(QueueError::JobNotFound(job_id))
    }

    /// Snapshot of all known jobs, in submission order.
    pub fn jobs(&self) -> Vec<Job> {
        let registry = self.registry.read().unwrap();
        registry.jobs.values().cloned().collect()
    }

    /// Number of jobs currently being processed.
    pub fn processing_count(&self) -> usize {
        self.registry.read().unwrap().active
    }

    /// Number of jobs awaiting dispatch.
    pub fn pending_count(&self) -> usize {
        self.registry.read().unwrap().pending.len()
    }

    /// Claim the next pending job if a worker slot is free.
    ///
    /// Pops the queue head, transitions it to `processing`, and bumps the
    /// active count under one lock acquisition, so the concurrency ceiling
    /// holds under concurrent callers.
    pub(crate) fn claim_next(&self, max_concurrent: usize) -> Option<Job> {
        let mut registry = self.registry.write().unwrap();
        if registry.active >= max_concurrent {
            return None;
        }
        while let Some(job_id) = registry.pending.pop_front() {
            let Some(job) = registry.jobs.get_mut(&job_id) else {
                warn!(job_id = %job_id, "pending entry without a job — dropping");
                continue;
            };
            if !job.status.can_transition(JobStatus::Processing) {
                warn!(job_id = %job_id, status = %job.status, "pending job not in queued state — dropping");
                continue;
            }
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now());
            let claimed = job.clone();
            registry.active += 1;
            self.persist(&registry);
            return Some(claimed);
        }
        None
    }

    /// Record a terminal outcome for a processing job and free its slot.
    pub(crate) fn finish(&self, job_id: Uuid, outcome: Result<(), QueueError>) -> Result<Job, QueueError> {
        let mut registry = self.registry.write().unwrap();
        registry.active = registry.active.saturating_sub(1);

        let job = registry
            .jobs
            .get_mut(&job_id)
            .ok_or(QueueError::JobNotFound(job_id))?;

        let target = if outcome.is_ok() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        if !job.status.can_transition(target) {
            return Err(QueueError::IllegalTransition {
                from: job.status,
                to: target,
            });
        }

        match outcome {
            Ok(()) => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.completed_at = Some(Utc::now());
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.failed_at = Some(Utc::now());
                job.error_message = Some(e.to_string());
            }
        }

        let finished = job.clone();
        self.persist(&registry);
        Ok(finished)
    }

    /// Account for a successfully flushed batch: bump the written-record
    /// count, re-estimate progress, and snapshot.
    pub(crate) fn record_flush(&self, job_id: Uuid, batch_len: usize, lines_seen: u64) {
        let mut registry = self.registry.write().unwrap();
        let Some(job) = registry.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "flush recorded for unknown job");
            return;
        };
        job.lines_processed += batch_len as u64;
        job.progress = job.progress.max(estimate_progress(lines_seen));
        self.persist(&registry);
    }

    /// Record a per-line parse failure (subject to the retention cap).
    ///
    /// Error entries are informational and ride along with the next
    /// state-affecting snapshot rather than forcing one of their own.
    pub(crate) fn record_line_error(&self, job_id: Uuid, error: LineError) {
        let mut registry = self.registry.write().unwrap();
        let Some(job) = registry.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "line error recorded for unknown job");
            return;
        };
        job.record_error(error);
    }

    fn persist(&self, registry: &Registry) {
        let snapshot = Snapshot {
            jobs: registry.jobs.values().cloned().collect(),
            pending: registry.pending.iter().copied().collect(),
        };
        if let Err(e) = self.snapshots.save(&snapshot) {
            warn!(path = %self.snapshots.path().display(), "failed to persist job snapshot: {}", e);
        }
    }
}

/// `min(99, round(lines_seen / assumed_total * 100))`.
fn estimate_progress(lines_seen: u64) -> u8 {
    let pct = (lines_seen as f64 / ASSUMED_TOTAL_LINES as f64 * 100.0).round();
    pct.min(99.0) as u8
}
