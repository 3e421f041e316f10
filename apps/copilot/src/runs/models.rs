use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Job fields recorded before a run starts.
#[derive(Debug, Clone, Copy)]
pub struct NewJob<'a> {
    pub job_url: Option<&'a str>,
    pub company: Option<&'a str>,
    pub role: Option<&'a str>,
    pub jd_text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
}
