//! The job model: one file's ingestion task and its tracked state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cap on recorded per-line errors. Once reached, further entries are
/// dropped; the first 100 errors are the ones retained.
pub const MAX_RECORDED_ERRORS: usize = 100;

/// Error excerpts carry at most this many characters of the offending line.
const EXCERPT_MAX_CHARS: usize = 100;

/// Current status of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the edge `self -> to` is legal.
    ///
    /// The only legal edges are `queued -> processing` and
    /// `processing -> {completed, failed}`. Crash-recovery reconciliation
    /// resets `processing` jobs directly in the snapshot loader and does
    /// not go through transition validation.
    pub fn can_transition(self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A recorded per-line parse failure. Informational only; the line is
/// skipped and never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineError {
    /// 1-based physical line number in the source file.
    pub position: u64,
    pub message: String,
    /// The offending line, truncated to 100 characters.
    pub excerpt: String,
}

impl LineError {
    pub fn new(position: u64, message: impl Into<String>, line: &str) -> Self {
        Self {
            position,
            message: message.into(),
            excerpt: line.chars().take(EXCERPT_MAX_CHARS).collect(),
        }
    }
}

/// One ingestion job.
///
/// Mutated only through [`crate::store::JobStore`]; pipeline progress
/// updates go through the store's hooks so the job table and its snapshot
/// stay consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: Uuid,
    pub file_id: String,
    pub file_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    /// 0-100, non-decreasing while processing, forced to 100 on completion.
    pub progress: u8,
    /// Records successfully written to the datastore.
    pub lines_processed: u64,
    #[serde(default)]
    pub errors: Vec<LineError>,
    /// Fatal cause, set only when the job fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set when a restart interrupted this job and recovery re-queued it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_note: Option<String>,
}

impl Job {
    /// Fresh job in `queued` state with a newly allocated id.
    pub fn new(file_id: &str, file_name: &str) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            progress: 0,
            lines_processed: 0,
            errors: Vec::new(),
            error_message: None,
            recovery_note: None,
        }
    }

    /// Append a line error, honoring the retention cap.
    pub fn record_error(&mut self, error: LineError) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(error);
        }
    }
}
