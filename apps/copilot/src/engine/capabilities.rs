//! Capability Library: deterministic text tools used by the plan's tool steps.
//!
//! Both functions are pure: same input, same output, no I/O. Web search lives in
//! `crate::search` and grounding in `engine::grounding`.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Maximum number of keywords returned by `extract_keywords`.
pub const MAX_KEYWORDS: usize = 60;
/// Keywords shorter than this are dropped.
pub const MIN_KEYWORD_LEN: usize = 3;
/// Maximum number of evidence lines returned by `extract_resume_claims`.
pub const MAX_RESUME_CLAIMS: usize = 120;
/// A claim line must be strictly longer than this many characters.
pub const MIN_CLAIM_CHARS: usize = 20;

const STOP_WORDS: &[&str] = &[
    "the", "and", "with", "for", "you", "our", "are", "will", "have", "this", "that", "from",
    "to", "in", "on", "of", "a", "an", "as", "by", "or", "we", "is", "be", "at",
];

const BULLET_MARKERS: &[char] = &['-', '*', '•'];

/// Line boundaries recognised in resume text, including the form feeds and
/// Unicode separators that PDF extraction leaves behind.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z+#.]{1,30}").expect("keyword pattern is valid"))
}

/// Extracts ATS-style keywords from a job description.
///
/// Tokens are letter-led runs that may contain `+`, `#` and `.` (so `c++`, `c#`,
/// `node.js` survive). Output is lowercase, stop-word free, deduplicated in
/// first-seen order and capped at `MAX_KEYWORDS`.
pub fn extract_keywords(job_text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    keyword_pattern()
        .find_iter(job_text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|k| k.len() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(&k.as_str()))
        .filter(|k| seen.insert(k.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

/// Extracts bullet-style evidence lines from resume text.
///
/// These lines are the only evidence the grounding check accepts, so they must be
/// extracted before any bullet is verified.
pub fn extract_resume_claims(resume_text: &str) -> Vec<String> {
    resume_text
        .split(LINE_BREAKS)
        .map(str::trim)
        .filter(|line| line.starts_with(BULLET_MARKERS) && line.chars().count() > MIN_CLAIM_CHARS)
        .take(MAX_RESUME_CLAIMS)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_TEXT: &str = "Looking for a Python backend engineer with AWS and Docker experience.";

    #[test]
    fn test_keywords_for_backend_posting() {
        let keywords = extract_keywords(JOB_TEXT);
        assert_eq!(
            keywords,
            [
                "looking",
                "python",
                "backend",
                "engineer",
                "aws",
                "docker",
                "experience."
            ]
        );
    }

    #[test]
    fn test_keywords_keep_symbol_tokens() {
        let keywords = extract_keywords("Strong C++ and C# skills, Node.js a plus");
        assert!(keywords.contains(&"c++".to_string()));
        assert!(keywords.contains(&"node.js".to_string()));
        // "C#" lowercases to "c#", which is shorter than three characters
        assert!(!keywords.contains(&"c#".to_string()));
    }

    #[test]
    fn test_keywords_drop_stop_words_and_short_tokens() {
        let keywords = extract_keywords("The team and you will have an ML role at our org");
        for k in &keywords {
            assert!(!STOP_WORDS.contains(&k.as_str()), "stop word leaked: {k}");
            assert!(k.len() >= MIN_KEYWORD_LEN, "short token leaked: {k}");
        }
        assert_eq!(keywords, ["team", "role", "org"]);
    }

    #[test]
    fn test_keywords_deduplicate_case_insensitively_in_order() {
        let keywords = extract_keywords("Rust rust RUST Kafka rust kafka");
        assert_eq!(keywords, ["rust", "kafka"]);
    }

    #[test]
    fn test_keywords_are_idempotent() {
        assert_eq!(extract_keywords(JOB_TEXT), extract_keywords(JOB_TEXT));
    }

    #[test]
    fn test_keywords_capped_at_sixty() {
        let text: String = (0..100u8)
            .map(|i| {
                let first = (b'a' + i / 26) as char;
                let second = (b'a' + i % 26) as char;
                format!("skill{first}{second} ")
            })
            .collect();
        let keywords = extract_keywords(&text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_keywords_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   42 7 ").is_empty());
    }

    #[test]
    fn test_claims_keep_long_bullet_lines_only() {
        let resume = "\
Jane Doe
Experience
  - Built payment reconciliation service in Python on AWS
* Migrated Docker images to a shared registry
• Reduced p99 latency of the search API by caching
- Too short
Plain sentence that is definitely longer than twenty characters";

        let claims = extract_resume_claims(resume);
        assert_eq!(
            claims,
            [
                "- Built payment reconciliation service in Python on AWS",
                "* Migrated Docker images to a shared registry",
                "• Reduced p99 latency of the search API by caching",
            ]
        );
    }

    #[test]
    fn test_claims_length_boundary_is_exclusive() {
        let exactly_twenty = format!("-{}", "a".repeat(19));
        assert_eq!(exactly_twenty.chars().count(), 20);
        let twenty_one = format!("-{}", "a".repeat(20));

        let resume = format!("{exactly_twenty}\n{twenty_one}");
        assert_eq!(extract_resume_claims(&resume), [twenty_one]);
    }

    #[test]
    fn test_claims_capped_at_one_twenty() {
        let resume: String = (0..200)
            .map(|i| format!("- Delivered project number {i} on schedule\n"))
            .collect();
        let claims = extract_resume_claims(&resume);
        assert_eq!(claims.len(), MAX_RESUME_CLAIMS);
        assert_eq!(claims[0], "- Delivered project number 0 on schedule");
    }

    #[test]
    fn test_claims_split_on_form_feed_and_carriage_return() {
        let resume = "- Built billing pipelines in Python\x0c- Shipped a Rust ingestion service\r\n\
                      - Migrated CI to GitHub Actions\u{2028}- Cut AWS spend by a third overall";
        let claims = extract_resume_claims(resume);
        assert_eq!(
            claims,
            [
                "- Built billing pipelines in Python",
                "- Shipped a Rust ingestion service",
                "- Migrated CI to GitHub Actions",
                "- Cut AWS spend by a third overall",
            ]
        );
    }

    #[test]
    fn test_claims_empty_without_bullets() {
        let resume = "Jane Doe\nSenior engineer with ten years of Python experience.";
        assert!(extract_resume_claims(resume).is_empty());
    }
}
