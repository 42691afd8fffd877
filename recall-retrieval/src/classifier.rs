//! Query strategy classification. Pure, total, and cheap enough for every keystroke.

use std::sync::LazyLock;

use recall_core::models::{ClassificationResult, SearchQuery, SearchStrategy};
use regex::Regex;

/// Dense weight for exact-phrase queries.
pub const QUOTED_ALPHA: f64 = 0.2;
/// Dense weight for code-like queries.
pub const CODE_ALPHA: f64 = 0.3;
/// Dense weight for natural language.
pub const NATURAL_LANGUAGE_ALPHA: f64 = 0.7;

static QUOTED_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]+""#).unwrap());

/// Call `f(`, member access `a.b`, or chaining after a close paren `).x` / `)(`.
static CODE_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_$][\w$]*\(|[A-Za-z_$][\w$]*\.[A-Za-z_$]|\)[.(A-Za-z_$]").unwrap()
});

/// Pick a search strategy and dense weight from the query text alone.
pub fn classify(text: &str) -> ClassificationResult {
    if QUOTED_PHRASE.is_match(text) {
        ClassificationResult::new(SearchStrategy::Sparse, QUOTED_ALPHA)
    } else if CODE_SYNTAX.is_match(text) {
        ClassificationResult::new(SearchStrategy::Hybrid, CODE_ALPHA)
    } else {
        ClassificationResult::new(SearchStrategy::Hybrid, NATURAL_LANGUAGE_ALPHA)
    }
}

/// Classification for a request, honouring an explicit strategy override.
pub fn resolve_strategy(query: &SearchQuery) -> ClassificationResult {
    match query.strategy {
        Some(strategy) => ClassificationResult::from_override(strategy),
        None => classify(&query.text),
    }
}
