//! Multipart file upload into the object store.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;

use super::{bad_request, internal_error, ApiError};

/// POST /upload — accepts multipart/form-data with a `file` field.
///
/// Stores the bytes under a fresh fileId and returns it; the fileId is what
/// callers pass to `POST /process/{fileId}` to start ingestion.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("multipart error: {e}")))?
        .ok_or_else(|| bad_request("no file provided"))?;

    let file_name = field.file_name().unwrap_or("unnamed").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| bad_request(format!("failed to read file: {e}")))?;

    if bytes.len() > state.max_file_size {
        return Err(bad_request(format!(
            "file exceeds {} byte limit ({} bytes)",
            state.max_file_size,
            bytes.len()
        )));
    }

    let file_id = Uuid::new_v4().to_string();
    let size = bytes.len();
    state
        .files
        .put(&file_id, bytes)
        .await
        .map_err(|e| internal_error("failed to upload file", e))?;

    info!(file_id = %file_id, file_name = %file_name, bytes = size, "file uploaded");

    Ok(Json(json!({
        "success": true,
        "fileId": file_id,
        "fileName": file_name,
        "size": size,
        "message": "File uploaded successfully",
    })))
}
