//! Execution Log: one entry per plan step, appended in plan order.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::plan::{Step, StepStatus};
use crate::llm_client::LlmError;

/// Successful end states of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Executed; carries a small summary of what changed.
    Done(Map<String, Value>),
    /// Precondition unmet; carries the reason. Nothing was mutated.
    Skipped(String),
}

/// Why a step failed. Captured in the log; never aborts the run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("oracle call failed: {0}")]
    Oracle(#[from] LlmError),

    #[error("failed to encode oracle request: {0}")]
    Encode(serde_json::Error),

    #[error("oracle reply is not a JSON object: {0}")]
    MalformedReply(#[from] serde_json::Error),

    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

pub type StepResult = Result<StepOutcome, StepError>;

pub fn status_of(result: &StepResult) -> StepStatus {
    match result {
        Ok(StepOutcome::Done(_)) => StepStatus::Done,
        Ok(StepOutcome::Skipped(_)) => StepStatus::Skipped,
        Err(_) => StepStatus::Failed,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: &'static str,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_summary: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn new(step: &Step, result: StepResult) -> Self {
        let status = status_of(&result);
        let mut entry = LogEntry {
            id: step.id,
            name: step.name,
            kind: step.kind.label(),
            status,
            output_summary: None,
            reason: None,
            error: None,
        };

        match result {
            Ok(StepOutcome::Done(summary)) => entry.output_summary = Some(summary),
            Ok(StepOutcome::Skipped(reason)) => entry.reason = Some(reason),
            Err(e) => entry.error = Some(e.to_string()),
        }

        entry
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionLog {
    pub plan_id: Uuid,
    pub steps: Vec<LogEntry>,
}

impl ExecutionLog {
    pub fn new(plan_id: Uuid) -> Self {
        Self {
            plan_id,
            steps: Vec::new(),
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.steps.push(entry);
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|e| e.status == status).count()
    }
}
