//! Identifier resolution from free-form input.
//!
//! Accepts either a bare 7–9 digit token or a URL from which one can be
//! extracted. Patterns are tried in declaration order and the first match
//! wins:
//!
//! | Pattern | Example |
//! |---|---|
//! | bare token | `80057281` |
//! | title path | `https://www.example.com/title/80057281` |
//! | watch path | `https://www.example.com/watch/80057281?trackId=1` |
//! | query parameter | `https://www.example.com/browse?jbv=80057281` |
//!
//! The digit run must be bounded by a non-digit or the end of input, so a
//! 10-digit number never yields a truncated 9-digit token.

use crate::error::HarvestError;
use crate::types::Identifier;
use regex::Regex;
use std::sync::LazyLock;

static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("bare", r"^([0-9]{7,9})$"),
        ("title", r"/title/([0-9]{7,9})(?:[^0-9]|$)"),
        ("watch", r"/watch/([0-9]{7,9})(?:[^0-9]|$)"),
        ("query", r"[?&#](?:jbv|movieid|id)=([0-9]{7,9})(?:[^0-9]|$)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("identifier pattern must compile")))
    .collect()
});

/// Extract the canonical identifier from `input`.
///
/// Leading and trailing whitespace is ignored. Fails with
/// [`HarvestError::InvalidIdentifier`] when no pattern matches.
pub fn resolve(input: &str) -> Result<Identifier, HarvestError> {
    let trimmed = input.trim();
    for (name, pattern) in PATTERNS.iter() {
        if let Some(token) = pattern.captures(trimmed).and_then(|c| c.get(1)) {
            tracing::debug!(pattern = name, token = token.as_str(), "identifier resolved");
            return Ok(Identifier {
                raw: input.to_string(),
                canonical: token.as_str().to_string(),
            });
        }
    }
    Err(HarvestError::InvalidIdentifier(input.to_string()))
}
