//! Axum route handlers for the Copilot API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::ats_scoring::AtsScorecard;
use crate::engine::capabilities::extract_keywords;
use crate::engine::orchestrator::{RunInput, RunOutput};
use crate::errors::AppError;
use crate::runs::models::NewJob;
use crate::runs::storage::{save_artifact, upsert_job};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub output: RunOutput,
    pub run_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub job_text: String,
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub ats_keywords: Vec<String>,
    pub scorecard: AtsScorecard,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/run
///
/// Records the job, executes the full copilot plan and stores the result.
/// Step failures do not fail the request; they are in `execution_log`.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(input): Json<RunInput>,
) -> Result<Json<RunResponse>, AppError> {
    if input.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }
    if input.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }

    let context = &input.context;
    let job_id = upsert_job(
        &state.db,
        NewJob {
            job_url: context.job_url.as_deref(),
            company: context.company_name.as_deref(),
            role: context.role_title.as_deref(),
            jd_text: &input.job_text,
        },
    )
    .await?;

    let output = state.orchestrator.run(&input).await;

    let payload = serde_json::to_value(&output)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode run output: {e}")))?;
    let run_id = save_artifact(&state.db, job_id, &payload).await?;

    info!("Run {run_id} stored for job {job_id}");

    Ok(Json(RunResponse {
        output,
        run_id,
        job_id,
    }))
}

/// POST /api/v1/score
///
/// Keyword coverage of the resume against the job text. No oracle call, no storage.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let ats_keywords = extract_keywords(&request.job_text);
    let scorecard = state
        .ats_scorer
        .score(&ats_keywords, &request.resume_text)
        .await;

    Ok(Json(ScoreResponse {
        ats_keywords,
        scorecard,
    }))
}
