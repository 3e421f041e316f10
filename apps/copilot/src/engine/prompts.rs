// All oracle prompt constants for the copilot engine.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::engine::plan::PatchTarget;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM, STYLE_INSTRUCTION};

const COPILOT_ROLE: &str = "You are an agentic Job Application Copilot. \
    You tailor application material for one job using only the candidate's resume.";

/// Full system prompt sent with every oracle request of a run.
pub fn copilot_system() -> String {
    format!("{COPILOT_ROLE}\n\n{GROUNDING_INSTRUCTION}\n\n{STYLE_INSTRUCTION}\n\n{JSON_ONLY_SYSTEM}")
}

/// Generative step prompt template.
/// Replace: {step_json}, {patch_key}, {patch_schema}
pub const PATCH_PROMPT_TEMPLATE: &str = r#"Perform ONLY this step and return a JSON PATCH object containing only the key you update.
Do not include markdown. Do not include extra text.

Step:
{step_json}

Rules:
- Do NOT invent anything not supported by resume_text.
- If data is missing, write a neutral version.
- Use existing extracted keywords / research already present in working_output_so_far when possible.

This step updates exactly one key: "{patch_key}".
Return a JSON object with this EXACT schema:
{patch_schema}"#;

/// Example reply shape for each generative step.
pub fn patch_schema(target: PatchTarget) -> &'static str {
    match target {
        PatchTarget::JdSummary => {
            r#"{"jd_summary": {"must_haves": ["5+ years Python"], "nice_to_haves": ["Kubernetes"]}}"#
        }
        PatchTarget::TailoredResumeBullets => {
            r#"{"tailored_resume_bullets": ["Built payment reconciliation service in Python on AWS"]}"#
        }
        PatchTarget::CoverLetter => r#"{"cover_letter": "Dear Hiring Team, ..."}"#,
        PatchTarget::InterviewPack => {
            r#"{"interview_pack": {"star_stories": ["Situation/Task/Action/Result ..."], "behavioral_qs": ["Tell me about ..."], "technical_qs": ["How would you ..."]}}"#
        }
        PatchTarget::VerifierReport => {
            r#"{"verifier_report": {"summary": "...", "grounded_claims": ["..."], "neutralized_claims": ["..."]}}"#
        }
    }
}

pub const REWRITE_TASK: &str =
    "Rewrite ONLY the flagged bullets to be grounded in resume evidence or neutral.";

pub const REWRITE_RULES: [&str; 3] = [
    "Do not invent metrics or tools not in resume",
    "Keep bullets ATS dense",
    "Return JSON: {rewrites: [{from:..., to:...}]} where from is the exact flagged bullet",
];

pub const OVERVIEW_TASK: &str = "Write a short company overview (2-3 sentences) based only on \
    provided search snippets. If missing, write neutral.";
