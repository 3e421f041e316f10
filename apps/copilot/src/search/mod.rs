//! Web search collaborator.
//!
//! Search is optional for a run: every failure mode (missing key, transport error,
//! bad status, undecodable body) is reported in `SearchResponse::error` instead of
//! being raised, so the research step can degrade gracefully.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Outcome of one search call. `results` is empty whenever `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn failed(query: &str, error: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Never fails; see module docs.
    async fn search(&self, query: &str, max_results: usize) -> SearchResponse;
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Tavily search API client.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl TavilyClient {
    pub fn new(client: Client, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            timeout,
        }
    }

    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, reqwest::Error> {
        let response = self
            .client
            .post(TAVILY_API_URL)
            .timeout(self.timeout)
            .json(&json!({
                "api_key": api_key,
                "query": query,
                "max_results": max_results,
                "include_answer": false,
                "include_raw_content": false,
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: TavilyResponse = response.json().await?;
        Ok(body.results)
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> SearchResponse {
        let Some(api_key) = self.api_key.as_deref() else {
            return SearchResponse::failed(query, "Missing TAVILY_API_KEY");
        };

        match self.fetch(api_key, query, max_results).await {
            Ok(results) => {
                debug!("Search '{query}' returned {} results", results.len());
                SearchResponse {
                    query: query.to_string(),
                    results,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Search '{query}' failed: {e}");
                SearchResponse::failed(query, e.to_string())
            }
        }
    }
}
