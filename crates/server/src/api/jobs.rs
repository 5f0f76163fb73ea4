//! Job submission and status endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use filepipe_queue::Job;

use crate::state::AppState;

use super::{not_found, ApiError};

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    /// Original file name to annotate records with; defaults to the fileId.
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

/// POST /process/{fileId} — enqueue an ingestion job.
///
/// The fileId is not validated here; a missing file fails the job once it
/// is dispatched.
pub async fn process_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<ProcessQuery>,
) -> (StatusCode, Json<Value>) {
    let file_name = query.file_name.as_deref().unwrap_or(&file_id);
    let job = state.dispatcher.submit(&file_id, file_name);
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "jobId": job.job_id,
            "status": job.status,
        })),
    )
}

/// GET /job/{jobId} — full job snapshot.
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    state
        .dispatcher
        .store()
        .get(job_id)
        .map(Json)
        .map_err(|e| not_found(e.to_string()))
}

/// GET /jobs — summaries of all known jobs, in submission order.
pub async fn jobs_list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let summaries: Vec<Value> = state
        .dispatcher
        .store()
        .jobs()
        .iter()
        .map(job_summary)
        .collect();
    Json(json!(summaries))
}

fn job_summary(job: &Job) -> Value {
    json!({
        "jobId": job.job_id,
        "fileName": job.file_name,
        "status": job.status,
        "progress": job.progress,
        "linesProcessed": job.lines_processed,
        "errorCount": job.errors.len(),
        "createdAt": job.created_at,
    })
}
