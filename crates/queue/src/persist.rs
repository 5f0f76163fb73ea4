//! Restart-safe snapshot of the job table and pending queue.
//!
//! The full state is serialized as one JSON document and rewritten after
//! every state-affecting operation. Writes go through a temp file plus
//! rename so a crash mid-write never leaves a torn snapshot. Loading is
//! fail-soft: a missing or unreadable snapshot yields empty state and a
//! log line, never a startup abort.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::job::{Job, JobStatus};

/// Serialized form of the job registry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub jobs: Vec<Job>,
    pub pending: Vec<Uuid>,
}

/// Reads and writes the snapshot file.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write the snapshot, replacing the previous one atomically.
    pub fn save(&self, snapshot: &Snapshot) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load the last snapshot, reconciling jobs a crash interrupted.
    ///
    /// Every restored job still marked `processing` is forced back to
    /// `queued` with a recovery note and re-appended to the pending queue —
    /// no worker is running for it anymore. This is the only path by which
    /// a job returns to `queued`.
    pub fn load(&self) -> Snapshot {
        if !self.path.exists() {
            return Snapshot::default();
        }

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), "failed to read job snapshot: {} — starting empty", e);
                return Snapshot::default();
            }
        };

        let mut snapshot: Snapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %self.path.display(), "corrupt job snapshot: {} — starting empty", e);
                return Snapshot::default();
            }
        };

        let mut requeued = 0usize;
        for job in &mut snapshot.jobs {
            if job.status == JobStatus::Processing {
                job.status = JobStatus::Queued;
                job.started_at = None;
                job.recovery_note = Some("process restarted during processing".to_string());
                if !snapshot.pending.contains(&job.job_id) {
                    snapshot.pending.push(job.job_id);
                }
                requeued += 1;
            }
        }

        info!(
            jobs = snapshot.jobs.len(),
            pending = snapshot.pending.len(),
            requeued = requeued,
            "loaded persisted jobs"
        );
        snapshot
    }
}
