mod config;
mod db;
mod engine;
mod errors;
mod ingest;
mod llm_client;
mod routes;
mod runs;
mod search;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::engine::ats_scoring::default_scorer;
use crate::engine::orchestrator::{EngineSettings, Orchestrator};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::search::TavilyClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Copilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // One HTTP client for the oracle and web search; timeouts are per request
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let llm = LlmClient::new(http.clone(), config.anthropic_api_key.clone(), config.llm_timeout);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    if config.tavily_api_key.is_none() {
        warn!("TAVILY_API_KEY not set; company research will report errors");
    }
    let search = TavilyClient::new(http, config.tavily_api_key.clone(), config.search_timeout);

    let orchestrator = Orchestrator::new(
        Arc::new(llm),
        Arc::new(search),
        EngineSettings {
            grounding: config.grounding,
            ..EngineSettings::default()
        },
    );
    info!(
        "Grounding: min_overlap={}, min_token_len={}",
        config.grounding.min_overlap, config.grounding.min_token_len
    );

    // Build app state
    let state = AppState {
        db,
        orchestrator: Arc::new(orchestrator),
        ats_scorer: default_scorer(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
