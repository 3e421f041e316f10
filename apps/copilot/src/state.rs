use std::sync::Arc;

use sqlx::PgPool;

use crate::engine::ats_scoring::AtsScorer;
use crate::engine::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Shared by every concurrent run; holds no per-run state.
    pub orchestrator: Arc<Orchestrator>,
    /// Pluggable ATS scorer. Default: KeywordAtsScorer.
    pub ats_scorer: Arc<dyn AtsScorer>,
}
