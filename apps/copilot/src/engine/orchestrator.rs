//! Orchestrator: runs one copilot plan from start to finish.
//!
//! Flow per run: build_plan → for each step in order: execute → finish step →
//! append log entry. A step ends `done`, `skipped` or `failed`; a failure only
//! loses that step's contribution and the loop moves on. The run itself cannot
//! fail: it always returns a total Working Document plus the full log.
//!
//! One `Orchestrator` is shared by all concurrent runs. It holds only read-only
//! handles; every piece of mutable run state lives in `RunState`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::engine::capabilities::{extract_keywords, extract_resume_claims};
use crate::engine::document::{apply_rewrites, NewsItem, WorkingDocument, GROUNDING_CHECK};
use crate::engine::grounding::{GroundingParams, GroundingVerifier};
use crate::engine::log::{status_of, ExecutionLog, LogEntry, StepError, StepOutcome, StepResult};
use crate::engine::plan::{build_plan, PatchTarget, PlanContext, Step, StepKind, StepStatus, Tool};
use crate::engine::prompts::copilot_system;
use crate::engine::protocol::{
    overview_request, parse_overview, parse_patch, parse_rewrites, patch_request,
    rewrite_request, OverviewSnippets, ParsedPatch, ResearchResults, RunContext,
    MIN_OVERVIEW_SNIPPETS,
};
use crate::llm_client::GenerationOracle;
use crate::search::WebSearch;

/// At most this many news items are kept in `company_research.recent_news`.
const MAX_NEWS_ITEMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub grounding: GroundingParams,
    /// `max_results` for each research query.
    pub research_results_per_query: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grounding: GroundingParams::default(),
            research_results_per_query: 4,
        }
    }
}

/// Inputs of one run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunInput {
    pub job_text: String,
    pub resume_text: String,
    #[serde(flatten)]
    pub context: PlanContext,
}

/// The finished run: the document's keys plus `execution_log`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    #[serde(flatten)]
    pub document: WorkingDocument,
    pub execution_log: ExecutionLog,
}

/// Mutable state of a single run. Never shared.
struct RunState<'a> {
    input: &'a RunInput,
    document: WorkingDocument,
    keywords: Vec<String>,
    resume_claims: Vec<String>,
    research: Option<ResearchResults>,
}

impl<'a> RunState<'a> {
    fn new(input: &'a RunInput) -> Self {
        Self {
            input,
            document: WorkingDocument::default(),
            keywords: Vec::new(),
            resume_claims: Vec::new(),
            research: None,
        }
    }

    fn company_name(&self) -> Option<&'a str> {
        let input = self.input;
        input
            .context
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    fn context(&self) -> RunContext<'_> {
        let context = &self.input.context;
        RunContext {
            job_url: context.job_url.as_deref(),
            company_name: context.company_name.as_deref(),
            role_title: context.role_title.as_deref(),
            job_text: &self.input.job_text,
            resume_text: &self.input.resume_text,
            ats_keywords: &self.keywords,
            resume_claims: &self.resume_claims,
            research_results: self.research.as_ref(),
        }
    }
}

pub struct Orchestrator {
    oracle: Arc<dyn GenerationOracle>,
    search: Arc<dyn WebSearch>,
    verifier: GroundingVerifier,
    research_results_per_query: usize,
    system: String,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn GenerationOracle>,
        search: Arc<dyn WebSearch>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            oracle,
            search,
            verifier: GroundingVerifier::new(settings.grounding),
            research_results_per_query: settings.research_results_per_query,
            system: copilot_system(),
        }
    }

    /// Executes the full plan for `input`. Never fails; inspect the log for outcomes.
    pub async fn run(&self, input: &RunInput) -> RunOutput {
        let mut plan = build_plan(input.context.clone());
        let mut log = ExecutionLog::new(plan.plan_id);
        let mut state = RunState::new(input);

        info!(
            plan_id = %plan.plan_id,
            "Starting copilot run with {} steps (recipe v{})",
            plan.steps.len(),
            plan.recipe_version
        );

        for step in plan.steps.iter_mut() {
            let result = self.execute(step, &mut state).await;

            match &result {
                Ok(StepOutcome::Done(_)) => info!(plan_id = %plan.plan_id, "Step {} done", step.id),
                Ok(StepOutcome::Skipped(reason)) => {
                    warn!(plan_id = %plan.plan_id, "Step {} skipped: {reason}", step.id)
                }
                Err(e) => warn!(plan_id = %plan.plan_id, "Step {} failed: {e}", step.id),
            }

            step.finish(status_of(&result));
            log.append(LogEntry::new(step, result));
        }

        info!(
            plan_id = %plan.plan_id,
            "Copilot run finished: {} done, {} skipped, {} failed",
            log.count(StepStatus::Done),
            log.count(StepStatus::Skipped),
            log.count(StepStatus::Failed)
        );

        RunOutput {
            document: state.document,
            execution_log: log,
        }
    }

    async fn execute(&self, step: &Step, state: &mut RunState<'_>) -> StepResult {
        match step.kind {
            StepKind::Tool { tool } => match tool {
                Tool::ExtractKeywords => Ok(Self::extract_keywords(state)),
                Tool::ExtractResumeClaims => Ok(Self::extract_claims(state)),
                Tool::WebSearch => Ok(self.research_company(state).await),
                Tool::CheckGrounding => self.check_grounding(state).await,
            },
            StepKind::Generative { patch_key } => self.generate(step, patch_key, state).await,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Tool steps
    // ────────────────────────────────────────────────────────────────────────

    fn extract_keywords(state: &mut RunState<'_>) -> StepOutcome {
        state.keywords = extract_keywords(&state.input.job_text);
        state.document.ats_keywords = state.keywords.clone();
        StepOutcome::Done(summary([("keyword_count", json!(state.keywords.len()))]))
    }

    fn extract_claims(state: &mut RunState<'_>) -> StepOutcome {
        state.resume_claims = extract_resume_claims(&state.input.resume_text);
        StepOutcome::Done(summary([(
            "resume_claims_count",
            json!(state.resume_claims.len()),
        )]))
    }

    /// Three searches about the company. Search errors come back as data, so this
    /// step only ever skips (no company) or succeeds.
    async fn research_company(&self, state: &mut RunState<'_>) -> StepOutcome {
        let Some(company) = state.company_name() else {
            return StepOutcome::Skipped("company_name missing".to_string());
        };
        let role = state.input.context.role_title.as_deref().unwrap_or("").trim();
        let limit = self.research_results_per_query;

        let stack_query = [company, role, "tech stack"]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let engineering_blog = self
            .search
            .search(&format!("{company} engineering blog"), limit)
            .await;
        let recent_news = self
            .search
            .search(&format!("{company} recent news"), limit)
            .await;
        let role_stack = self.search.search(&stack_query, limit).await;

        let news_items: Vec<NewsItem> = recent_news
            .results
            .iter()
            .take(MAX_NEWS_ITEMS)
            .filter_map(|r| match (r.title.as_deref(), r.url.as_deref()) {
                (Some(title), Some(url)) if !title.is_empty() && !url.is_empty() => Some(NewsItem {
                    title: title.to_string(),
                    url: url.to_string(),
                }),
                _ => None,
            })
            .collect();

        let has_error = recent_news.error.is_some();
        if let Some(error) = &recent_news.error {
            warn!("News search for '{company}' reported an error: {error}");
        }

        let news_count = news_items.len();
        state.document.company_research.recent_news = news_items;
        state.research = Some(ResearchResults {
            engineering_blog,
            recent_news,
            role_stack,
        });

        StepOutcome::Done(summary([
            ("news_items", json!(news_count)),
            ("has_error", json!(has_error)),
        ]))
    }

    /// Verifies bullets against resume claims; asks the oracle to rewrite only the
    /// flagged ones, then verifies again. The document changes only if every call
    /// succeeded.
    async fn check_grounding(&self, state: &mut RunState<'_>) -> StepResult {
        let initial = self
            .verifier
            .check(&state.document.tailored_resume_bullets, &state.resume_claims);

        if initial.flagged_count == 0 {
            let report = serde_json::to_value(&initial).map_err(StepError::Encode)?;
            state.document.record_check(GROUNDING_CHECK, report);
            return Ok(StepOutcome::Done(summary([("flagged_count", json!(0))])));
        }

        let request = rewrite_request(
            &initial.flagged_points(),
            &state.input.job_text,
            &state.keywords,
            &state.resume_claims,
        );
        let reply = self.oracle.complete(&self.system, &request).await?;
        let rewrites = parse_rewrites(&reply)?;

        let bullets = &state.document.tailored_resume_bullets;
        let revised = apply_rewrites(bullets, &rewrites);
        let rewritten = revised.iter().zip(bullets).filter(|(a, b)| a != b).count();

        let report = self.verifier.check(&revised, &state.resume_claims);
        let report_value = serde_json::to_value(&report).map_err(StepError::Encode)?;

        state.document.tailored_resume_bullets = revised;
        state.document.record_check(GROUNDING_CHECK, report_value);

        Ok(StepOutcome::Done(summary([
            ("flagged_count", json!(report.flagged_count)),
            ("initial_flagged_count", json!(initial.flagged_count)),
            ("rewritten_count", json!(rewritten)),
        ])))
    }

    // ────────────────────────────────────────────────────────────────────────
    // Generative steps
    // ────────────────────────────────────────────────────────────────────────

    async fn generate(
        &self,
        step: &Step,
        target: PatchTarget,
        state: &mut RunState<'_>,
    ) -> StepResult {
        let prompt = patch_request(step, target, &state.context(), &state.document)?;
        let reply = self.oracle.complete(&self.system, &prompt).await?;
        let ParsedPatch {
            patch,
            ignored_keys,
        } = parse_patch(target, &reply)?;

        state.document.apply(patch);

        let mut output = summary([("patched_keys", json!([target.key()]))]);
        if !ignored_keys.is_empty() {
            warn!(
                "Step {} returned keys it does not own, ignoring: {:?}",
                step.id, ignored_keys
            );
            output.insert("ignored_keys".to_string(), json!(ignored_keys));
        }
        if let Some(overview) = self.fill_company_overview(state).await {
            output.insert("company_overview".to_string(), overview);
        }

        Ok(StepOutcome::Done(output))
    }

    /// Writes `company_research.overview` from search snippets once research has
    /// produced enough of them. A failed attempt is reported in the step summary
    /// and retried after the next generative step.
    async fn fill_company_overview(&self, state: &mut RunState<'_>) -> Option<Value> {
        if state.document.has_company_overview() {
            return None;
        }
        let company = state.company_name()?;
        let snippets = state.research.as_ref()?.overview_snippets();
        if snippets.len() < MIN_OVERVIEW_SNIPPETS {
            return None;
        }

        match self.request_overview(company, &snippets).await {
            Ok(overview) if !overview.is_empty() => {
                state.document.company_research.overview = overview;
                Some(json!("filled"))
            }
            Ok(_) => Some(json!("empty reply")),
            Err(e) => {
                warn!("Company overview for '{company}' failed: {e}");
                Some(json!(format!("failed: {e}")))
            }
        }
    }

    async fn request_overview(
        &self,
        company: &str,
        snippets: &OverviewSnippets,
    ) -> Result<String, StepError> {
        let request = overview_request(company, snippets)?;
        let reply = self.oracle.complete(&self.system, &request).await?;
        parse_overview(&reply)
    }
}

fn summary<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
