//! Copilot engine: fixed plan, deterministic capabilities, oracle-backed steps.

pub mod ats_scoring;
pub mod capabilities;
pub mod document;
pub mod grounding;
pub mod handlers;
pub mod log;
pub mod orchestrator;
pub mod plan;
pub mod prompts;
pub mod protocol;
