//! ATS Scoring: pluggable, trait-based scorer for keyword coverage of a resume.
//!
//! Default: `KeywordAtsScorer` (pure-Rust, deterministic, no oracle call).
//!
//! `AppState` holds an `Arc<dyn AtsScorer>`, chosen at startup.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hit and miss lists are truncated to this many keywords.
const MAX_LISTED: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsScorecard {
    pub score: u32,    // 0 – 100
    pub coverage: f64, // 0.0 – 1.0, three decimals
    pub hit_count: usize,
    pub miss_count: usize,
    pub hits: Vec<String>,
    pub misses: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the `/score` handler.
#[async_trait]
pub trait AtsScorer: Send + Sync {
    async fn score(&self, keywords: &[String], resume_text: &str) -> AtsScorecard;
}

pub fn default_scorer() -> Arc<dyn AtsScorer> {
    Arc::new(KeywordAtsScorer)
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordAtsScorer
// ────────────────────────────────────────────────────────────────────────────

/// Algorithm:
/// 1. Lowercase the resume.
/// 2. For each non-blank keyword: hit if it appears between word boundaries.
/// 3. coverage = hits / max(1, keywords); blank keywords count in the denominator only.
/// 4. score = round(100 × coverage)
pub struct KeywordAtsScorer;

#[async_trait]
impl AtsScorer for KeywordAtsScorer {
    async fn score(&self, keywords: &[String], resume_text: &str) -> AtsScorecard {
        compute_ats_score(keywords, resume_text)
    }
}

fn compute_ats_score(keywords: &[String], resume_text: &str) -> AtsScorecard {
    let resume = resume_text.to_lowercase();
    let mut hits = Vec::new();
    let mut misses = Vec::new();

    for keyword in keywords {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if contains_word(&resume, &needle) {
            hits.push(keyword.clone());
        } else {
            misses.push(keyword.clone());
        }
    }

    let coverage = hits.len() as f64 / keywords.len().max(1) as f64;
    let hit_count = hits.len();
    let miss_count = misses.len();
    hits.truncate(MAX_LISTED);
    misses.truncate(MAX_LISTED);

    AtsScorecard {
        score: (100.0 * coverage).round() as u32,
        coverage: (coverage * 1000.0).round() / 1000.0,
        hit_count,
        miss_count,
        hits,
        misses,
    }
}

/// Whole-word containment; `needle` is matched literally.
fn contains_word(haystack: &str, needle: &str) -> bool {
    match Regex::new(&format!(r"\b{}\b", regex::escape(needle))) {
        Ok(pattern) => pattern.is_match(haystack),
        // only reachable for keywords beyond the regex size limit
        Err(_) => haystack.contains(needle),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
