//! Axum route handlers for stored runs.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::document::WorkingDocument;
use crate::errors::AppError;
use crate::runs::diff::unified_diff;
use crate::runs::models::RunSummary;
use crate::runs::storage::{list_runs_for_job, load_run};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub run_a: String,
    pub run_b: String,
}

#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub bullets_diff: String,
    pub cover_letter_diff: String,
}

/// GET /api/v1/diff?run_a=..&run_b=..
///
/// Unified diffs of the tailored bullets and cover letters of two stored runs.
pub async fn handle_diff(
    State(state): State<AppState>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<DiffResponse>, AppError> {
    let a = load_document(&state, &query.run_a).await?;
    let b = load_document(&state, &query.run_b).await?;

    Ok(Json(DiffResponse {
        bullets_diff: unified_diff(
            &a.tailored_resume_bullets.join("\n"),
            &b.tailored_resume_bullets.join("\n"),
            "run_a_bullets",
            "run_b_bullets",
        ),
        cover_letter_diff: unified_diff(
            &a.cover_letter,
            &b.cover_letter,
            "run_a_cover",
            "run_b_cover",
        ),
    }))
}

/// GET /api/v1/jobs/:job_id/runs
pub async fn handle_list_runs(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<RunSummary>>, AppError> {
    let runs = list_runs_for_job(&state.db, job_id).await?;
    Ok(Json(runs))
}

async fn load_document(state: &AppState, run_id: &str) -> Result<WorkingDocument, AppError> {
    let not_found = || AppError::NotFound(format!("run_id {run_id} not found"));

    let run_id = Uuid::parse_str(run_id.trim()).map_err(|_| not_found())?;
    let payload = load_run(&state.db, run_id).await?.ok_or_else(not_found)?;

    serde_json::from_value(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored run {run_id} is unreadable: {e}")))
}
