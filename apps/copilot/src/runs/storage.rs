//! Postgres persistence for jobs and run artifacts.

use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::runs::models::{NewJob, RunSummary};

/// Stable id for a posting URL (UUID v5 in the URL namespace); random without one.
pub fn job_id_for(job_url: Option<&str>) -> Uuid {
    match job_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()),
        None => Uuid::new_v4(),
    }
}

/// Inserts the job, or refreshes its fields when the same URL was seen before.
pub async fn upsert_job(pool: &PgPool, job: NewJob<'_>) -> Result<Uuid, sqlx::Error> {
    let job_id = job_id_for(job.job_url);

    sqlx::query(
        r#"
        INSERT INTO jobs (job_id, job_url, company, role, jd_text)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (job_id) DO UPDATE SET
            job_url = EXCLUDED.job_url,
            company = EXCLUDED.company,
            role    = EXCLUDED.role,
            jd_text = EXCLUDED.jd_text
        "#,
    )
    .bind(job_id)
    .bind(job.job_url)
    .bind(job.company)
    .bind(job.role)
    .bind(job.jd_text)
    .execute(pool)
    .await?;

    Ok(job_id)
}

/// Stores a finished run's payload and returns its new `run_id`.
pub async fn save_artifact(pool: &PgPool, job_id: Uuid, payload: &Value) -> Result<Uuid, sqlx::Error> {
    let run_id = Uuid::new_v4();

    sqlx::query("INSERT INTO artifacts (run_id, job_id, payload) VALUES ($1, $2, $3)")
        .bind(run_id)
        .bind(job_id)
        .bind(payload)
        .execute(pool)
        .await?;

    info!("Saved run {run_id} for job {job_id}");
    Ok(run_id)
}

pub async fn load_run(pool: &PgPool, run_id: Uuid) -> Result<Option<Value>, sqlx::Error> {
    sqlx::query_scalar("SELECT payload FROM artifacts WHERE run_id = $1")
        .bind(run_id)
        .fetch_optional(pool)
        .await
}

/// Runs stored for `job_id`, newest first.
pub async fn list_runs_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<RunSummary>, sqlx::Error> {
    sqlx::query_as::<_, RunSummary>(
        r#"
        SELECT run_id, created_at
        FROM artifacts
        WHERE job_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}
