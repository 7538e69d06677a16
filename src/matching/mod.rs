use crate::error::MatchError;
use crate::metrics::memory_stats_mb;
use crate::models::{MatchStatus, Record};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

// Cascade resolution (last-name filter, then ordered narrowing steps)
pub mod cascade;

pub mod comparator;

// Shared helper functions (similarity scoring)
mod helpers;

pub mod predicates;
pub mod uniqueness;
pub mod validator;

pub use cascade::{CascadeState, Resolution, Resolver};
pub use comparator::{Comparison, FieldComparator, Similarity, SimilarityKind};
pub use uniqueness::UniquenessIndex;
pub use validator::{ValidationSummary, validate_matches};

/// Reference rows usable as candidates. Rows without a `candidate_id` are
/// dropped on construction and only counted.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    records: Vec<Record>,
    excluded: usize,
}

impl ReferenceSet {
    pub fn new(records: Vec<Record>) -> Result<Self, MatchError> {
        let total = records.len();
        let records: Vec<Record> = records.into_iter().filter(Record::has_candidate_id).collect();
        if total > 0 && records.is_empty() {
            return Err(MatchError::MissingIdentifiers { rows: total });
        }
        let excluded = total - records.len();
        if excluded > 0 {
            log::warn!(
                "Excluded {} of {} reference rows without candidate_id",
                excluded,
                total
            );
        }
        Ok(Self { records, excluded })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped for lacking an identifier.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    pub fn pool(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub update_every: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { update_every: 500 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
    pub stage: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Fan rows out over the rayon pool. Results are identical either way.
    pub parallel: bool,
    pub progress: ProgressConfig,
}

/// Resolve every row, returning outcomes in row order.
pub fn resolve_all<F>(
    rows: &[Record],
    resolver: &Resolver<'_>,
    opts: &MatchOptions,
    on_progress: F,
) -> Vec<Resolution>
where
    F: Fn(ProgressUpdate) + Sync,
{
    let total = rows.len();
    let every = opts.progress.update_every.max(1);
    let done = AtomicUsize::new(0);
    let stage = if opts.parallel { "resolve_parallel" } else { "resolve" };

    let tick = || {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        if n % every == 0 || n == total {
            let mem = memory_stats_mb();
            on_progress(ProgressUpdate {
                processed: n,
                total,
                percent: n as f32 / total as f32 * 100.0,
                mem_used_mb: mem.used_mb,
                mem_avail_mb: mem.avail_mb,
                stage,
            });
        }
    };

    if opts.parallel {
        rows.par_iter()
            .map(|row| {
                let out = resolver.resolve(row);
                tick();
                out
            })
            .collect()
    } else {
        rows.iter()
            .map(|row| {
                let out = resolver.resolve(row);
                tick();
                out
            })
            .collect()
    }
}

/// Counts taken at commit time, before duplicate/unmatched correction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitTally {
    pub matched: usize,
    pub review: usize,
    pub unresolved: usize,
    pub by_status: BTreeMap<MatchStatus, usize>,
}

impl CommitTally {
    pub fn from_resolutions(resolutions: &[Resolution]) -> Self {
        let mut tally = CommitTally::default();
        for res in resolutions {
            match res.status() {
                Some(MatchStatus::Review) => tally.review += 1,
                Some(_) => tally.matched += 1,
                None => tally.unresolved += 1,
            }
            if let Some(status) = res.status() {
                *tally.by_status.entry(status).or_insert(0) += 1;
            }
        }
        tally
    }
}

/// Commit each outcome onto its row and tally the commits.
pub fn apply_resolutions(records: &mut [Record], resolutions: &[Resolution]) -> CommitTally {
    debug_assert_eq!(records.len(), resolutions.len());
    for (rec, res) in records.iter_mut().zip(resolutions) {
        res.commit(rec);
    }
    CommitTally::from_resolutions(resolutions)
}
