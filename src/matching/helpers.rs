//! Shared helper functions for similarity scoring.

use strsim::{jaro_winkler, levenshtein};

/// Levenshtein similarity as a ratio (0.0-1.0) over character counts.
pub(crate) fn sim_levenshtein(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = levenshtein(a, b);
    1.0 - (dist as f64 / max_len as f64)
}

/// Jaro-Winkler similarity (0.0-1.0).
pub(crate) fn sim_jaro_winkler(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b)
}

/// Sort whitespace-separated tokens so "ann mary" and "mary ann" compare equal.
pub(crate) fn token_sort_key(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
