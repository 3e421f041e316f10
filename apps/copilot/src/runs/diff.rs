use similar::TextDiff;

/// Line-based unified diff of `a` → `b`. Empty when the texts are identical.
pub fn unified_diff(a: &str, b: &str, from: &str, to: &str) -> String {
    if a == b {
        return String::new();
    }
    TextDiff::from_lines(a, b)
        .unified_diff()
        .header(from, to)
        .to_string()
}
