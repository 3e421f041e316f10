//! Generative Patch Protocol: how the engine talks to the generation oracle.
//!
//! Three request shapes, each answered with a single JSON object:
//! - step patch: `{"<owned key>": ...}` for one generative step
//! - rewrite: `{"rewrites": [{"from", "to"}]}` for flagged bullets
//! - overview: `{"overview": "..."}` for the company research section
//!
//! Replies may be wrapped in markdown fences; anything else that is not a JSON
//! object is a step failure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::engine::document::{Patch, Rewrite, WorkingDocument};
use crate::engine::log::StepError;
use crate::engine::plan::{PatchTarget, Step};
use crate::engine::prompts::{
    patch_schema, OVERVIEW_TASK, PATCH_PROMPT_TEMPLATE, REWRITE_RULES, REWRITE_TASK,
};
use crate::llm_client::strip_json_fences;
use crate::search::{SearchResponse, SearchResult};

/// Snippets per research query offered to the overview request.
const OVERVIEW_SNIPPETS_PER_QUERY: usize = 2;
/// The overview request is only worth making with at least this many snippets.
pub const MIN_OVERVIEW_SNIPPETS: usize = 2;

/// Raw search responses gathered by the research step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchResults {
    pub engineering_blog: SearchResponse,
    pub recent_news: SearchResponse,
    pub role_stack: SearchResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverviewSnippets {
    pub engineering_blog: Vec<SearchResult>,
    pub recent_news: Vec<SearchResult>,
}

impl OverviewSnippets {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.engineering_blog.len() + self.recent_news.len()
    }
}

impl ResearchResults {
    pub fn overview_snippets(&self) -> OverviewSnippets {
        let take = |response: &SearchResponse| -> Vec<SearchResult> {
            response
                .results
                .iter()
                .take(OVERVIEW_SNIPPETS_PER_QUERY)
                .cloned()
                .collect()
        };
        OverviewSnippets {
            engineering_blog: take(&self.engineering_blog),
            recent_news: take(&self.recent_news),
        }
    }
}

/// Everything the oracle may use to produce a patch.
#[derive(Debug, Serialize)]
pub struct RunContext<'a> {
    pub job_url: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub role_title: Option<&'a str>,
    pub job_text: &'a str,
    pub resume_text: &'a str,
    pub ats_keywords: &'a [String],
    pub resume_claims: &'a [String],
    pub research_results: Option<&'a ResearchResults>,
}

#[derive(Serialize)]
struct PatchRequest<'a> {
    step_id: &'a str,
    step_name: &'a str,
    context: &'a RunContext<'a>,
    working_output_so_far: &'a WorkingDocument,
}

/// A validated patch plus any reply keys the step was not allowed to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPatch {
    pub patch: Patch,
    pub ignored_keys: Vec<String>,
}

/// Builds the user prompt for a generative step.
pub fn patch_request(
    step: &Step,
    target: PatchTarget,
    context: &RunContext<'_>,
    document: &WorkingDocument,
) -> Result<String, StepError> {
    let step_json = serde_json::to_string(&PatchRequest {
        step_id: step.id,
        step_name: step.name,
        context,
        working_output_so_far: document,
    })
    .map_err(StepError::Encode)?;

    Ok(PATCH_PROMPT_TEMPLATE
        .replace("{patch_key}", target.key())
        .replace("{patch_schema}", patch_schema(target))
        .replace("{step_json}", &step_json))
}

/// Parses a step reply into the patch for `target`.
///
/// The owned key must be present and well-shaped; other keys are dropped and
/// returned in `ignored_keys`.
pub fn parse_patch(target: PatchTarget, reply: &str) -> Result<ParsedPatch, StepError> {
    let mut object: Map<String, Value> = serde_json::from_str(strip_json_fences(reply))?;
    let key = target.key();

    let value = object
        .remove(key)
        .ok_or_else(|| StepError::InvalidPatch(format!("reply is missing key '{key}'")))?;

    let patch = Patch::from_value(target, value)
        .map_err(|e| StepError::InvalidPatch(format!("'{key}' has the wrong shape: {e}")))?;

    Ok(ParsedPatch {
        patch,
        ignored_keys: object.keys().cloned().collect(),
    })
}

/// Builds the request asking the oracle to rewrite only the flagged bullets.
pub fn rewrite_request(
    flagged_points: &[String],
    job_text: &str,
    ats_keywords: &[String],
    resume_claims: &[String],
) -> String {
    json!({
        "task": REWRITE_TASK,
        "job_text": job_text,
        "ats_keywords": ats_keywords,
        "resume_claims": resume_claims,
        "flagged_points": flagged_points,
        "rules": REWRITE_RULES,
    })
    .to_string()
}

/// Parses a rewrite reply. Entries without a string `from` and `to` are skipped,
/// so their bullets pass through unchanged.
pub fn parse_rewrites(reply: &str) -> Result<Vec<Rewrite>, StepError> {
    let object: Map<String, Value> = serde_json::from_str(strip_json_fences(reply))?;
    match object.get("rewrites") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries.iter().filter_map(Rewrite::from_entry).collect()),
        Some(other) => Err(StepError::InvalidPatch(format!(
            "'rewrites' must be a list, got {other}"
        ))),
    }
}

/// Builds the request for a short, snippet-only company overview.
pub fn overview_request(
    company_name: &str,
    snippets: &OverviewSnippets,
) -> Result<String, StepError> {
    let snippets = serde_json::to_value(snippets).map_err(StepError::Encode)?;
    Ok(json!({
        "task": OVERVIEW_TASK,
        "company_name": company_name,
        "snippets": snippets,
        "output_format": {"overview": "string"},
    })
    .to_string())
}

#[derive(Deserialize)]
struct OverviewReply {
    #[serde(default)]
    overview: Option<String>,
}

/// A missing or null `overview` parses as empty.
pub fn parse_overview(reply: &str) -> Result<String, StepError> {
    let reply: OverviewReply = serde_json::from_str(strip_json_fences(reply))?;
    Ok(reply.overview.unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::document::apply_rewrites;
    use crate::engine::plan::{build_plan, PlanContext};

    fn result(title: &str) -> SearchResult {
        SearchResult {
            title: Some(title.to_string()),
            url: Some(format!("https://example.com/{title}")),
            content: Some(format!("{title} snippet")),
        }
    }

    fn response(query: &str, titles: &[&str]) -> SearchResponse {
        SearchResponse {
            query: query.to_string(),
            results: titles.iter().map(|t| result(t)).collect(),
            error: None,
        }
    }

    fn context<'a>(keywords: &'a [String], claims: &'a [String]) -> RunContext<'a> {
        RunContext {
            job_url: None,
            company_name: Some("Acme"),
            role_title: Some("Backend Engineer"),
            job_text: "Python backend role",
            resume_text: "- Built things in Python",
            ats_keywords: keywords,
            resume_claims: claims,
            research_results: None,
        }
    }

    #[test]
    fn test_patch_request_embeds_step_context_and_document() {
        let plan = build_plan(PlanContext::default());
        let keywords = vec!["python".to_string()];
        let claims = vec!["- Built things in Python".to_string()];
        let document = WorkingDocument {
            ats_keywords: keywords.clone(),
            ..Default::default()
        };

        let prompt = patch_request(
            &plan.steps[4],
            PatchTarget::TailoredResumeBullets,
            &context(&keywords, &claims),
            &document,
        )
        .unwrap();

        assert!(prompt.contains(r#""step_id":"S5""#));
        assert!(prompt.contains(r#""company_name":"Acme""#));
        assert!(prompt.contains(r#""working_output_so_far":{"#));
        assert!(prompt.contains(r#"exactly one key: "tailored_resume_bullets""#));
        assert!(!prompt.contains("{step_json}"));
    }

    #[test]
    fn test_parse_patch_accepts_fenced_reply() {
        let parsed = parse_patch(
            PatchTarget::CoverLetter,
            "```json\n{\"cover_letter\": \"Dear Acme team\"}\n```",
        )
        .unwrap();
        assert_eq!(parsed.patch, Patch::CoverLetter("Dear Acme team".to_string()));
        assert!(parsed.ignored_keys.is_empty());
    }

    #[test]
    fn test_parse_patch_drops_foreign_keys() {
        let parsed = parse_patch(
            PatchTarget::TailoredResumeBullets,
            r#"{"tailored_resume_bullets": ["A"], "cover_letter": "sneaky"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.patch,
            Patch::TailoredResumeBullets(vec!["A".to_string()])
        );
        assert_eq!(parsed.ignored_keys, ["cover_letter"]);
    }

    #[test]
    fn test_parse_patch_missing_key_is_invalid() {
        let err = parse_patch(PatchTarget::CoverLetter, r#"{"letter": "hi"}"#).unwrap_err();
        assert!(matches!(err, StepError::InvalidPatch(_)));
        assert!(err.to_string().contains("cover_letter"));
    }

    #[test]
    fn test_parse_patch_wrong_shape_is_invalid() {
        let err = parse_patch(PatchTarget::InterviewPack, r#"{"interview_pack": "later"}"#)
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidPatch(_)));
    }

    #[test]
    fn test_parse_patch_prose_is_malformed() {
        let err = parse_patch(PatchTarget::CoverLetter, "Sure! Here is your letter.").unwrap_err();
        assert!(matches!(err, StepError::MalformedReply(_)));

        let err = parse_patch(PatchTarget::CoverLetter, r#"["cover_letter"]"#).unwrap_err();
        assert!(matches!(err, StepError::MalformedReply(_)));
    }

    #[test]
    fn test_rewrite_request_lists_flagged_points() {
        let request = rewrite_request(
            &["Led a team of 40".to_string()],
            "job",
            &["python".to_string()],
            &[],
        );
        let value: Value = serde_json::from_str(&request).unwrap();
        assert_eq!(value["task"], REWRITE_TASK);
        assert_eq!(value["flagged_points"][0], "Led a team of 40");
        assert_eq!(value["rules"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_rewrites_defaults_to_empty() {
        assert!(parse_rewrites("{}").unwrap().is_empty());

        assert!(parse_rewrites(r#"{"rewrites": null}"#).unwrap().is_empty());

        let rewrites =
            parse_rewrites(r#"{"rewrites": [{"from": "B", "to": "B2"}, {"from": "C", "to": ""}]}"#)
                .unwrap();
        assert_eq!(rewrites.len(), 2);
        assert_eq!(rewrites[0].to, "B2");
        assert_eq!(rewrites[1].to, "");
    }

    #[test]
    fn test_parse_rewrites_skips_entries_without_string_fields() {
        let rewrites = parse_rewrites(
            r#"{"rewrites": [{"from": "B", "to": null}, {"from": 7, "to": "x"}, {"from": "C"}, {"from": "C", "to": "C2"}]}"#,
        )
        .unwrap();
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].from, "C");

        let bullets = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(apply_rewrites(&bullets, &rewrites), ["A", "B", "C2"]);
    }

    #[test]
    fn test_parse_rewrites_rejects_non_list() {
        let err = parse_rewrites(r#"{"rewrites": "none needed"}"#).unwrap_err();
        assert!(matches!(err, StepError::InvalidPatch(_)));
    }

    #[test]
    fn test_parse_overview_trims() {
        assert_eq!(
            parse_overview(r#"{"overview": "  Acme builds rockets. "}"#).unwrap(),
            "Acme builds rockets."
        );
        assert_eq!(parse_overview(r#"{"overview": null}"#).unwrap(), "");
        assert!(parse_overview("not json").is_err());
    }

    #[test]
    fn test_overview_snippets_take_two_per_query() {
        let research = ResearchResults {
            engineering_blog: response("blog", &["b1", "b2", "b3"]),
            recent_news: response("news", &["n1"]),
            role_stack: response("stack", &["s1", "s2"]),
        };
        let snippets = research.overview_snippets();
        assert_eq!(snippets.engineering_blog.len(), 2);
        assert_eq!(snippets.recent_news.len(), 1);
        assert_eq!(snippets.len(), 3);

        let request = overview_request("Acme", &snippets).unwrap();
        let value: Value = serde_json::from_str(&request).unwrap();
        assert_eq!(value["company_name"], "Acme");
        assert_eq!(value["snippets"]["engineering_blog"][1]["title"], "b2");
    }
}
