//! Field-to-field comparison with threshold semantics.
//!
//! Both values are normalized (diacritics folded, case-folded, whitespace
//! trimmed and collapsed) before scoring. Equal normalized values score 1.0,
//! a value compared against an empty one scores 0.0, and everything else is
//! scored by a pluggable [`Similarity`].

use crate::matching::helpers::{sim_jaro_winkler, sim_levenshtein, token_sort_key};
use crate::normalize::normalize_text;
use serde::{Deserialize, Serialize};

/// A deterministic, symmetric string similarity in `0.0..=1.0`.
///
/// Inputs are already normalized and non-empty when called by
/// [`FieldComparator`].
pub trait Similarity: Send + Sync + std::fmt::Debug {
    fn score(&self, a: &str, b: &str) -> f64;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        sim_jaro_winkler(a, b)
    }
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        sim_levenshtein(a, b)
    }
    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Levenshtein ratio over whitespace tokens sorted alphabetically.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl Similarity for TokenSortRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        sim_levenshtein(&token_sort_key(a), &token_sort_key(b))
    }
    fn name(&self) -> &'static str {
        "token_sort"
    }
}

/// Named similarity choices for configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    JaroWinkler,
    Levenshtein,
    TokenSort,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub matched: bool,
    pub score: f64,
}

#[derive(Debug)]
pub struct FieldComparator {
    similarity: Box<dyn Similarity>,
}

impl Default for FieldComparator {
    fn default() -> Self {
        Self::new(JaroWinkler)
    }
}

impl FieldComparator {
    pub fn new<S: Similarity + 'static>(similarity: S) -> Self {
        Self {
            similarity: Box::new(similarity),
        }
    }

    pub fn from_kind(kind: SimilarityKind) -> Self {
        match kind {
            SimilarityKind::JaroWinkler => Self::new(JaroWinkler),
            SimilarityKind::Levenshtein => Self::new(NormalizedLevenshtein),
            SimilarityKind::TokenSort => Self::new(TokenSortRatio),
        }
    }

    pub fn similarity_name(&self) -> &'static str {
        self.similarity.name()
    }

    /// Score two raw field values in `0.0..=1.0`.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        let na = normalize_text(a);
        let nb = normalize_text(b);
        self.score_normalized(&na, &nb)
    }

    fn score_normalized(&self, na: &str, nb: &str) -> f64 {
        if na == nb {
            return 1.0;
        }
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }
        self.similarity.score(na, nb).clamp(0.0, 1.0)
    }

    /// Compare two raw field values. A threshold of 1.0 or more demands
    /// equality after normalization.
    pub fn compare(&self, a: &str, b: &str, threshold: f64) -> Comparison {
        let na = normalize_text(a);
        let nb = normalize_text(b);
        let score = self.score_normalized(&na, &nb);
        let matched = if na == nb {
            true
        } else if na.is_empty() || nb.is_empty() || threshold >= 1.0 {
            false
        } else {
            score >= threshold
        };
        Comparison { matched, score }
    }

    pub fn matches(&self, a: &str, b: &str, threshold: f64) -> bool {
        self.compare(a, b, threshold).matched
    }
}
