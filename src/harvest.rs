//! Rating harvest sheet: matched ratings stamped with per-sheet constants,
//! ready for upload.

use crate::config::HarvestConfig;
use crate::models::Record;
use serde::{Deserialize, Serialize};

pub const HARVEST_COLUMNS: [&str; 8] = [
    "candidate_id",
    "sig_rating",
    "our_rating",
    "span",
    "sig_id",
    "usesigrating",
    "ratingsession",
    "ratingformat_id",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRow {
    pub candidate_id: String,
    pub sig_rating: String,
    pub our_rating: String,
    pub span: String,
    pub sig_id: String,
    pub usesigrating: String,
    pub ratingsession: String,
    pub ratingformat_id: String,
}

impl HarvestRow {
    /// Values in [`HARVEST_COLUMNS`] order.
    pub fn values(&self) -> [&str; 8] {
        [
            &self.candidate_id,
            &self.sig_rating,
            &self.our_rating,
            &self.span,
            &self.sig_id,
            &self.usesigrating,
            &self.ratingsession,
            &self.ratingformat_id,
        ]
    }
}

/// Per-sheet constants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHarvest {
    pub span: String,
    pub sig_id: String,
    pub usesigrating: String,
    pub ratingsession: String,
    pub ratingformat_id: String,
}

impl RatingHarvest {
    pub fn from_config(cfg: &HarvestConfig) -> Self {
        Self {
            span: cfg.span.clone(),
            sig_id: cfg.sig_id.clone(),
            usesigrating: cfg.usesigrating.clone(),
            ratingsession: cfg.ratingsession.clone(),
            ratingformat_id: cfg.ratingformat_id.clone(),
        }
    }

    fn stamp(&self, candidate_id: &str, sig_rating: &str, our_rating: &str) -> HarvestRow {
        HarvestRow {
            candidate_id: candidate_id.to_string(),
            sig_rating: sig_rating.to_string(),
            our_rating: our_rating.to_string(),
            span: self.span.clone(),
            sig_id: self.sig_id.clone(),
            usesigrating: self.usesigrating.clone(),
            ratingsession: self.ratingsession.clone(),
            ratingformat_id: self.ratingformat_id.clone(),
        }
    }

    /// One row per worksheet record; with no records, `number_of_rows` rows
    /// carrying only the constants.
    pub fn generate(&self, records: &[Record], number_of_rows: usize) -> Vec<HarvestRow> {
        if records.is_empty() {
            return (0..number_of_rows).map(|_| self.stamp("", "", "")).collect();
        }
        let rows: Vec<HarvestRow> = records
            .iter()
            .map(|r| self.stamp(&r.candidate_id, &r.sig_rating, &r.our_rating))
            .collect();
        let missing = rows.iter().filter(|r| r.candidate_id.is_empty()).count();
        if missing > 0 {
            log::warn!("{} of {} harvest rows have no candidate_id", missing, rows.len());
        }
        rows
    }
}
