//! Plan Builder: the fixed, versioned recipe every copilot run executes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bumped whenever the recipe below changes shape or order.
pub const RECIPE_VERSION: u32 = 1;

/// Deterministic capabilities a tool step may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    ExtractKeywords,
    ExtractResumeClaims,
    WebSearch,
    CheckGrounding,
}

/// The Working Document key a generative step owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchTarget {
    JdSummary,
    TailoredResumeBullets,
    CoverLetter,
    InterviewPack,
    VerifierReport,
}

impl PatchTarget {
    /// The serialized document key this target writes.
    pub fn key(self) -> &'static str {
        match self {
            PatchTarget::JdSummary => "jd_summary",
            PatchTarget::TailoredResumeBullets => "tailored_resume_bullets",
            PatchTarget::CoverLetter => "cover_letter",
            PatchTarget::InterviewPack => "interview_pack",
            PatchTarget::VerifierReport => "verifier_report",
        }
    }
}

/// What a step does. Serialized flat into the step as `kind` plus its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Tool { tool: Tool },
    Generative { patch_key: PatchTarget },
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Tool { .. } => "tool",
            StepKind::Generative { .. } => "generative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Done,
    Skipped,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: StepKind,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

impl Step {
    /// Moves the step to its terminal status. Called once per step by the orchestrator.
    pub fn finish(&mut self, status: StepStatus) {
        debug_assert_eq!(self.status, StepStatus::Pending, "step {} finished twice", self.id);
        debug_assert!(status.is_terminal());
        self.status = status;
    }
}

/// Optional job metadata supplied with a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanContext {
    pub company_name: Option<String>,
    pub role_title: Option<String>,
    pub job_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub plan_id: Uuid,
    pub recipe_version: u32,
    pub context: PlanContext,
    pub steps: Vec<Step>,
}

struct RecipeStep {
    id: &'static str,
    name: &'static str,
    kind: StepKind,
    note: Option<&'static str>,
}

const RECIPE: [RecipeStep; 9] = [
    RecipeStep {
        id: "S1",
        name: "Extract ATS keywords from job text",
        kind: StepKind::Tool {
            tool: Tool::ExtractKeywords,
        },
        note: None,
    },
    RecipeStep {
        id: "S2",
        name: "Extract evidence claims from resume",
        kind: StepKind::Tool {
            tool: Tool::ExtractResumeClaims,
        },
        note: None,
    },
    RecipeStep {
        id: "S3",
        name: "Company research via web search",
        kind: StepKind::Tool {
            tool: Tool::WebSearch,
        },
        note: Some("Skip if company_name is missing or web API key unavailable."),
    },
    RecipeStep {
        id: "S4",
        name: "Summarize JD into must-haves and nice-to-haves",
        kind: StepKind::Generative {
            patch_key: PatchTarget::JdSummary,
        },
        note: None,
    },
    RecipeStep {
        id: "S5",
        name: "Draft ATS-optimized resume bullets grounded in resume",
        kind: StepKind::Generative {
            patch_key: PatchTarget::TailoredResumeBullets,
        },
        note: None,
    },
    RecipeStep {
        id: "S6",
        name: "Run grounding check and revise flagged bullets",
        kind: StepKind::Tool {
            tool: Tool::CheckGrounding,
        },
        note: None,
    },
    RecipeStep {
        id: "S7",
        name: "Write role-specific cover letter using JD + resume + research",
        kind: StepKind::Generative {
            patch_key: PatchTarget::CoverLetter,
        },
        note: None,
    },
    RecipeStep {
        id: "S8",
        name: "Generate interview pack (STAR stories + Qs)",
        kind: StepKind::Generative {
            patch_key: PatchTarget::InterviewPack,
        },
        note: None,
    },
    RecipeStep {
        id: "S9",
        name: "Produce verifier report (what was grounded vs neutralized)",
        kind: StepKind::Generative {
            patch_key: PatchTarget::VerifierReport,
        },
        note: None,
    },
];

/// Builds the plan for one run. Only `plan_id` differs between calls.
pub fn build_plan(context: PlanContext) -> Plan {
    let steps = RECIPE
        .iter()
        .map(|r| Step {
            id: r.id,
            name: r.name,
            kind: r.kind,
            status: StepStatus::Pending,
            note: r.note,
        })
        .collect();

    Plan {
        plan_id: Uuid::new_v4(),
        recipe_version: RECIPE_VERSION,
        context,
        steps,
    }
}
