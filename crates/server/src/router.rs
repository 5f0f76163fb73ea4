//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Body limit leaves headroom over the file cap for multipart framing.
    let upload_limit = state.max_file_size + 1024 * 1024;

    Router::new()
        .route("/health", get(api::health))
        .route(
            "/upload",
            post(api::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/process/{file_id}", post(api::process_file))
        .route("/job/{job_id}", get(api::job_status))
        .route("/jobs", get(api::jobs_list))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
