// Shared prompt fragments.
// The engine defines its own prompts.rs alongside it; this file holds the
// cross-cutting rules every oracle call carries.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "When asked for JSON, you MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Hard rules against fabrication, sent with every request.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Do NOT invent metrics, employers, projects, titles, certifications, dates, \
    tools, or achievements. Only claim what is supported by the provided resume text. \
    If something isn't in the resume, write a neutral or conditional version instead.";

/// Style guidance for application material.
pub const STYLE_INSTRUCTION: &str = "\
    Style: ATS-friendly, dense, specific, and professional. \
    Prefer action verbs and measurable impact ONLY if supported by the resume.";
