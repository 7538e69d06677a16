//! Match run report.
//!
//! `matched` and `review` are counted when rows are committed by the cascade;
//! `duplicates` and `unmatched` are counted after post-match correction. A
//! row that matched and was later found to share its identifier therefore
//! shows up in both `matched` and `duplicates`.

use crate::error::MatchError;
use crate::matching::{CommitTally, ValidationSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// `matched / total_rows * 100`, rounded to two decimals.
pub fn match_score(matched: usize, total_rows: usize) -> Result<f64, MatchError> {
    if total_rows == 0 {
        return Err(MatchError::EmptyWorksheet);
    }
    let pct = matched as f64 / total_rows as f64 * 100.0;
    Ok((pct * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub total_rows: usize,
    pub reference_rows: usize,
    pub excluded_reference_rows: usize,
    pub matched: usize,
    pub review: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub score: f64,
    /// Commit counts per cascade status, keyed by tag.
    pub by_status: BTreeMap<String, usize>,
    pub similarity: String,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
}

impl MatchReport {
    /// Counters and score as a flat, ordered list for tables and exports.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Matched", self.matched as f64),
            ("Needs Review", self.review as f64),
            ("Duplicates", self.duplicates as f64),
            ("Unmatched", self.unmatched as f64),
            ("Score (%)", self.score),
            ("Total Rows", self.total_rows as f64),
            ("Reference Rows", self.reference_rows as f64),
            ("Excluded Reference Rows", self.excluded_reference_rows as f64),
        ]
    }

    /// Same as [`entries`](Self::entries) keyed by name.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Builder for MatchReport to keep run bookkeeping in one place.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    pub total_rows: usize,
    pub reference_rows: usize,
    pub excluded_reference_rows: usize,
    pub tally: CommitTally,
    pub validation: ValidationSummary,
    pub similarity: String,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
}

impl Default for SummaryBuilder {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_rows: 0,
            reference_rows: 0,
            excluded_reference_rows: 0,
            tally: CommitTally::default(),
            validation: ValidationSummary::default(),
            similarity: String::new(),
            started_utc: now,
            ended_utc: now,
        }
    }
}

impl SummaryBuilder {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Default::default()
        }
    }

    /// Set reference pool counts.
    pub fn with_reference(mut self, usable: usize, excluded: usize) -> Self {
        self.reference_rows = usable;
        self.excluded_reference_rows = excluded;
        self
    }

    pub fn with_tally(mut self, tally: CommitTally) -> Self {
        self.tally = tally;
        self
    }

    pub fn with_validation(mut self, validation: ValidationSummary) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_similarity(mut self, name: &str) -> Self {
        self.similarity = name.to_string();
        self
    }

    /// Set run timestamps.
    pub fn with_timestamps(mut self, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn build(self) -> Result<MatchReport, MatchError> {
        let score = match_score(self.tally.matched, self.total_rows)?;
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        Ok(MatchReport {
            total_rows: self.total_rows,
            reference_rows: self.reference_rows,
            excluded_reference_rows: self.excluded_reference_rows,
            matched: self.tally.matched,
            review: self.tally.review,
            duplicates: self.validation.duplicates,
            unmatched: self.validation.unmatched,
            score,
            by_status: self
                .tally
                .by_status
                .iter()
                .map(|(st, n)| (st.as_str().to_string(), *n))
                .collect(),
            similarity: self.similarity,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
        })
    }
}
