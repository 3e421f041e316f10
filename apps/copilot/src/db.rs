use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables for jobs and stored run artifacts. Idempotent.
const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        job_id      UUID PRIMARY KEY,
        job_url     TEXT,
        company     TEXT,
        role        TEXT,
        jd_text     TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS artifacts (
        run_id      UUID PRIMARY KEY,
        job_id      UUID NOT NULL REFERENCES jobs(job_id),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        payload     JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS artifacts_job_id_created_at ON artifacts (job_id, created_at DESC)",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the `jobs` and `artifacts` tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to bootstrap database schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
