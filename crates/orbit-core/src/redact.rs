//! Secret-shaped substring redaction for anything shown or logged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement marker for redacted values.
pub const REDACTED: &str = "[REDACTED]";

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Authorization headers
        (r"(Bearer\s+)[A-Za-z0-9._\-~=+/]+", "${1}[REDACTED]"),
        // VERCEL_TOKEN=..., GITHUB_TOKEN=...
        (r#"([A-Z_]*TOKEN=)[^\s"']+"#, "${1}[REDACTED]"),
        // {"token": "..."}
        (r#""token"\s*:\s*"[^"]+""#, r#""token":"[REDACTED]""#),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Redact bearer tokens, `*TOKEN=` assignments, and JSON `token` fields.
pub fn redact_secrets(value: &str) -> String {
    PATTERNS
        .iter()
        .fold(value.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}
