//! Working Document: the accumulator each step of a run reads and patches.
//!
//! The schema is total: every field exists with an empty default from the moment
//! the document is created, so consumers (scoring, diffing, the UI) never index a
//! missing key. Generative steps change it only through a typed `Patch`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::plan::PatchTarget;

/// `verifier_report` key under which the grounding step stores its report.
pub const GROUNDING_CHECK: &str = "grounding_check";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JdSummary {
    #[serde(default)]
    pub must_haves: Vec<String>,
    #[serde(default)]
    pub nice_to_haves: Vec<String>,
    /// Any further sections the oracle chose to add (seniority, responsibilities, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyResearch {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub recent_news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewPack {
    #[serde(default)]
    pub star_stories: Vec<String>,
    #[serde(default)]
    pub behavioral_qs: Vec<String>,
    #[serde(default)]
    pub technical_qs: Vec<String>,
}

/// Sub-reports keyed by check name.
pub type VerifierReport = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingDocument {
    pub jd_summary: JdSummary,
    pub ats_keywords: Vec<String>,
    pub company_research: CompanyResearch,
    pub tailored_resume_bullets: Vec<String>,
    pub cover_letter: String,
    pub interview_pack: InterviewPack,
    pub verifier_report: VerifierReport,
}

/// A validated update for the one document field a generative step owns.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    JdSummary(JdSummary),
    TailoredResumeBullets(Vec<String>),
    CoverLetter(String),
    InterviewPack(InterviewPack),
    VerifierReport(VerifierReport),
}

impl Patch {
    /// Validates `value` against the shape of `target`'s field.
    pub fn from_value(target: PatchTarget, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match target {
            PatchTarget::JdSummary => Patch::JdSummary(serde_json::from_value(value)?),
            PatchTarget::TailoredResumeBullets => {
                Patch::TailoredResumeBullets(serde_json::from_value(value)?)
            }
            PatchTarget::CoverLetter => Patch::CoverLetter(serde_json::from_value(value)?),
            PatchTarget::InterviewPack => Patch::InterviewPack(serde_json::from_value(value)?),
            PatchTarget::VerifierReport => Patch::VerifierReport(serde_json::from_value(value)?),
        })
    }
}

/// One `{from, to}` substitution returned by the rewrite request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rewrite {
    pub from: String,
    pub to: String,
}

impl Rewrite {
    /// Reads one reply entry. `None` unless both `from` and `to` are strings.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let text = |key: &str| -> Option<String> { entry.get(key)?.as_str().map(String::from) };
        Some(Self {
            from: text("from")?,
            to: text("to")?,
        })
    }
}

impl WorkingDocument {
    /// Merges a patch. Fields are replaced wholesale, except `verifier_report`,
    /// whose sub-reports are merged by check name so earlier checks survive.
    pub fn apply(&mut self, patch: Patch) {
        match patch {
            Patch::JdSummary(summary) => self.jd_summary = summary,
            Patch::TailoredResumeBullets(bullets) => self.tailored_resume_bullets = bullets,
            Patch::CoverLetter(letter) => self.cover_letter = letter,
            Patch::InterviewPack(pack) => self.interview_pack = pack,
            Patch::VerifierReport(report) => self.verifier_report.extend(report),
        }
    }

    /// Stores a sub-report under `check` in `verifier_report`, replacing any previous one.
    pub fn record_check(&mut self, check: &str, report: Value) {
        self.verifier_report.insert(check.to_string(), report);
    }

    pub fn has_company_overview(&self) -> bool {
        !self.company_research.overview.trim().is_empty()
    }
}

/// Replaces every bullet equal to some rewrite's `from` with that rewrite's `to`.
///
/// The first matching rewrite with a non-empty `to` wins. Unmatched bullets pass
/// through unchanged and order is preserved.
pub fn apply_rewrites(bullets: &[String], rewrites: &[Rewrite]) -> Vec<String> {
    bullets
        .iter()
        .map(|bullet| {
            rewrites
                .iter()
                .find(|rw| rw.from == *bullet && !rw.to.is_empty())
                .map(|rw| rw.to.clone())
                .unwrap_or_else(|| bullet.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn rewrite(from: &str, to: &str) -> Rewrite {
        Rewrite {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_default_document_serializes_every_key() {
        let value = serde_json::to_value(WorkingDocument::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "jd_summary": {"must_haves": [], "nice_to_haves": []},
                "ats_keywords": [],
                "company_research": {"overview": "", "recent_news": []},
                "tailored_resume_bullets": [],
                "cover_letter": "",
                "interview_pack": {"star_stories": [], "behavioral_qs": [], "technical_qs": []},
                "verifier_report": {}
            })
        );
    }

    #[test]
    fn test_partial_payload_deserializes_to_total_document() {
        let doc: WorkingDocument = serde_json::from_value(json!({
            "tailored_resume_bullets": ["A"],
            "execution_log": {"plan_id": "x", "steps": []},
            "run_id": "r1"
        }))
        .unwrap();
        assert_eq!(doc.tailored_resume_bullets, ["A"]);
        assert_eq!(doc.cover_letter, "");
        assert!(doc.interview_pack.technical_qs.is_empty());
    }

    #[test]
    fn test_patch_validates_shape_per_target() {
        assert!(Patch::from_value(PatchTarget::CoverLetter, json!("Dear team")).is_ok());
        assert!(Patch::from_value(PatchTarget::CoverLetter, json!(["not", "a", "string"])).is_err());
        assert!(Patch::from_value(PatchTarget::TailoredResumeBullets, json!("one bullet")).is_err());
        assert!(Patch::from_value(PatchTarget::InterviewPack, json!({"star_stories": [1, 2]})).is_err());
    }

    #[test]
    fn test_jd_summary_keeps_extra_sections() {
        let patch = Patch::from_value(
            PatchTarget::JdSummary,
            json!({"must_haves": ["Python"], "seniority": "senior"}),
        )
        .unwrap();
        let mut doc = WorkingDocument::default();
        doc.apply(patch);

        assert_eq!(doc.jd_summary.must_haves, ["Python"]);
        assert!(doc.jd_summary.nice_to_haves.is_empty());
        assert_eq!(doc.jd_summary.extra["seniority"], "senior");
    }

    #[test]
    fn test_apply_replaces_owned_field_only() {
        let mut doc = WorkingDocument {
            cover_letter: "old".to_string(),
            ats_keywords: strings(&["python"]),
            ..Default::default()
        };
        doc.apply(Patch::CoverLetter("new".to_string()));

        assert_eq!(doc.cover_letter, "new");
        assert_eq!(doc.ats_keywords, ["python"]);
    }

    #[test]
    fn test_verifier_report_patch_merges_by_check_name() {
        let mut doc = WorkingDocument::default();
        doc.record_check(GROUNDING_CHECK, json!({"flagged_count": 0}));

        let mut report = VerifierReport::new();
        report.insert("summary".to_string(), json!("All bullets grounded"));
        doc.apply(Patch::VerifierReport(report));

        assert_eq!(doc.verifier_report[GROUNDING_CHECK]["flagged_count"], 0);
        assert_eq!(doc.verifier_report["summary"], "All bullets grounded");
    }

    #[test]
    fn test_rewrites_substitute_by_equality() {
        let bullets = strings(&["A", "B", "C"]);
        let result = apply_rewrites(&bullets, &[rewrite("B", "B2")]);
        assert_eq!(result, ["A", "B2", "C"]);
    }

    #[test]
    fn test_rewrites_ignore_unmatched_and_empty_targets() {
        let bullets = strings(&["A", "B"]);
        let result = apply_rewrites(&bullets, &[rewrite("Z", "Z2"), rewrite("A", "")]);
        assert_eq!(result, ["A", "B"]);
    }

    #[test]
    fn test_rewrite_entries_need_string_fields() {
        assert_eq!(
            Rewrite::from_entry(&json!({"from": "B", "to": "B2"})),
            Some(rewrite("B", "B2"))
        );
        assert_eq!(Rewrite::from_entry(&json!({"from": "B", "to": null})), None);
        assert_eq!(Rewrite::from_entry(&json!({"from": 3, "to": "B2"})), None);
        assert_eq!(Rewrite::from_entry(&json!({"to": "B2"})), None);
        assert_eq!(Rewrite::from_entry(&json!("B -> B2")), None);
    }

    #[test]
    fn test_rewrites_first_match_wins_and_duplicates_all_replaced() {
        let bullets = strings(&["B", "A", "B"]);
        let result = apply_rewrites(&bullets, &[rewrite("B", "first"), rewrite("B", "second")]);
        assert_eq!(result, ["first", "A", "first"]);
    }

    #[test]
    fn test_has_company_overview_ignores_whitespace() {
        let mut doc = WorkingDocument::default();
        assert!(!doc.has_company_overview());
        doc.company_research.overview = "   ".to_string();
        assert!(!doc.has_company_overview());
        doc.company_research.overview = "Acme builds rockets.".to_string();
        assert!(doc.has_company_overview());
    }
}
