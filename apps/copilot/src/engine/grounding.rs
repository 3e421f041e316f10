//! Grounding Verifier: flags generated statements weakly supported by resume evidence.
//!
//! Algorithm:
//! 1. Evidence corpus = every resume claim line joined with spaces, lowercased.
//! 2. For each statement: lowercase, take maximal `[a-z]` runs of at least
//!    `min_token_len` letters, deduplicate.
//! 3. Overlap = number of distinct tokens found as a substring of the corpus.
//! 4. Overlap < `min_overlap` → flagged.
//!
//! This is a lexical tripwire, not entailment: false positives and negatives are
//! expected. Short and numeric words carry no evidence weight.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const LOW_OVERLAP_REASON: &str = "Low overlap with resume evidence";

/// Tunable heuristic constants. There is no known "correct" setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingParams {
    /// Statements sharing fewer distinct tokens than this with the evidence are flagged.
    pub min_overlap: usize,
    /// Letter runs shorter than this are ignored.
    pub min_token_len: usize,
}

impl Default for GroundingParams {
    fn default() -> Self {
        Self {
            min_overlap: 2,
            min_token_len: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedPoint {
    pub point: String,
    pub reason: String,
}

/// Result of one grounding pass. Recomputed from scratch whenever bullets change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingReport {
    pub flagged: Vec<FlaggedPoint>,
    pub ok_count: usize,
    pub flagged_count: usize,
}

impl GroundingReport {
    pub fn flagged_points(&self) -> Vec<String> {
        self.flagged.iter().map(|f| f.point.clone()).collect()
    }
}

fn letter_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[a-z]+").expect("letter-run pattern is valid"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GroundingVerifier {
    params: GroundingParams,
}

impl GroundingVerifier {
    pub fn new(params: GroundingParams) -> Self {
        Self { params }
    }

    pub fn check(&self, generated_points: &[String], resume_claims: &[String]) -> GroundingReport {
        let corpus = resume_claims.join(" ").to_lowercase();

        let flagged: Vec<FlaggedPoint> = generated_points
            .iter()
            .filter(|point| self.overlap(point, &corpus) < self.params.min_overlap)
            .map(|point| FlaggedPoint {
                point: point.clone(),
                reason: LOW_OVERLAP_REASON.to_string(),
            })
            .collect();

        GroundingReport {
            ok_count: generated_points.len() - flagged.len(),
            flagged_count: flagged.len(),
            flagged,
        }
    }

    /// Counts distinct evidence-bearing tokens of `statement` present in `corpus`.
    /// `corpus` must already be lowercase.
    pub fn overlap(&self, statement: &str, corpus: &str) -> usize {
        let lowered = statement.to_lowercase();
        let tokens: HashSet<&str> = letter_runs()
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| t.len() >= self.params.min_token_len)
            .collect();

        tokens.into_iter().filter(|t| corpus.contains(t)).count()
    }
}

/// Runs the grounding check with the default parameters. The orchestrator uses a
/// `GroundingVerifier` built from configuration instead.
#[cfg(test)]
pub fn check_grounding(generated_points: &[String], resume_claims: &[String]) -> GroundingReport {
    GroundingVerifier::default().check(generated_points, resume_claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Vec<String> {
        vec![
            "- Built payment reconciliation service in Python on AWS".to_string(),
            "- Containerized deployments with Docker and Kubernetes".to_string(),
        ]
    }

    fn points(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_overlap_is_flagged() {
        let report = check_grounding(&points(&["Led quantum research initiatives"]), &claims());
        assert_eq!(report.flagged_count, 1);
        assert_eq!(report.flagged[0].reason, LOW_OVERLAP_REASON);
    }

    #[test]
    fn test_single_token_overlap_is_flagged() {
        // only "python" is shared
        let report = check_grounding(&points(&["Mentored Python interns weekly"]), &claims());
        assert_eq!(report.flagged_count, 1);
        assert_eq!(report.ok_count, 0);
    }

    #[test]
    fn test_two_token_overlap_passes() {
        // "payment" and "python" are shared
        let report = check_grounding(&points(&["Shipped payment tooling in Python"]), &claims());
        assert_eq!(report.flagged_count, 0);
        assert_eq!(report.ok_count, 1);
    }

    #[test]
    fn test_repeated_token_counts_once() {
        let report = check_grounding(&points(&["Docker docker DOCKER everywhere"]), &claims());
        assert_eq!(report.flagged_count, 1);
    }

    #[test]
    fn test_short_words_are_not_evidence() {
        // "aws" and "on" are shorter than four letters
        let report = check_grounding(&points(&["Ran AWS on EC2"]), &claims());
        assert_eq!(report.flagged_count, 1);
    }

    #[test]
    fn test_substring_match_counts() {
        // "deploy" is a substring of "deployments", "contain" of "containerized"
        let verifier = GroundingVerifier::default();
        let corpus = claims().join(" ").to_lowercase();
        assert_eq!(verifier.overlap("Deploy and contain", &corpus), 2);
    }

    #[test]
    fn test_counts_always_sum_to_total() {
        let generated = points(&[
            "Built reconciliation service for payments",
            "Invented a new database",
            "Containerized Python workloads with Docker",
            "",
        ]);
        let report = check_grounding(&generated, &claims());
        assert_eq!(report.ok_count + report.flagged_count, generated.len());
        assert_eq!(report.flagged.len(), report.flagged_count);
    }

    #[test]
    fn test_empty_evidence_flags_everything() {
        let generated = points(&["Built payment reconciliation service in Python on AWS"]);
        let report = check_grounding(&generated, &[]);
        assert_eq!(report.flagged_count, 1);
    }

    #[test]
    fn test_empty_points_produce_empty_report() {
        let report = check_grounding(&[], &claims());
        assert_eq!(report, GroundingReport::default());
    }

    #[test]
    fn test_custom_params_change_threshold() {
        let lenient = GroundingVerifier::new(GroundingParams {
            min_overlap: 1,
            min_token_len: 3,
        });
        let report = lenient.check(&points(&["Ran AWS workloads"]), &claims());
        assert_eq!(report.flagged_count, 0);
    }

    #[test]
    fn test_flagged_points_preserves_order() {
        let report = check_grounding(&points(&["alpha", "beta"]), &claims());
        assert_eq!(report.flagged_points(), ["alpha", "beta"]);
    }
}
