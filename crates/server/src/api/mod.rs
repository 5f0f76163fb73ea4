//! HTTP handlers and shared response helpers.

pub mod health;
pub mod jobs;
pub mod upload;

pub use health::*;
pub use jobs::*;
pub use upload::*;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error body shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.into(),
            details: None,
        }),
    )
}

pub(crate) fn not_found(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: msg.into(),
            details: None,
        }),
    )
}

pub(crate) fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: context.to_string(),
            details: Some(e.to_string()),
        }),
    )
}
