pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::engine::handlers as engine;
use crate::ingest::handlers as ingest;
use crate::runs::handlers as runs;
use crate::state::AppState;

/// Uploads larger than this are rejected before extraction.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route(
            "/api/v1/extract",
            post(ingest::handle_extract).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Copilot
        .route("/api/v1/run", post(engine::handle_run))
        .route("/api/v1/score", post(engine::handle_score))
        // Stored runs
        .route("/api/v1/diff", get(runs::handle_diff))
        .route("/api/v1/jobs/:job_id/runs", get(runs::handle_list_runs))
        .with_state(state)
}
