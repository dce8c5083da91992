use serde::{Deserialize, Serialize};

/// Similarity cutoffs for the fuzzy chunk-query filters.
///
/// These encode a recall-over-precision trade-off: the reasoning model cannot
/// spell-check a page, so near-misses (typos, partial labels) should still
/// surface. Tune rather than hard-code.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FilterPolicy {
    /// Minimum partial-ratio similarity for `text` filters.
    pub text_similarity: f64,
    /// Minimum partial-ratio similarity for `id` and `name` filters.
    /// Identifiers are shorter and more regular than display text, so the
    /// bar sits slightly higher.
    pub ident_similarity: f64,
}

impl FilterPolicy {
    pub const DEFAULT_TEXT_SIMILARITY: f64 = 0.80;
    pub const DEFAULT_IDENT_SIMILARITY: f64 = 0.85;
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            text_similarity: Self::DEFAULT_TEXT_SIMILARITY,
            ident_similarity: Self::DEFAULT_IDENT_SIMILARITY,
        }
    }
}
