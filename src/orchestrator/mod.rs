//! Orchestrator module: one full match run.
//!
//! Order of work: build the uniqueness index over the worksheet, resolve
//! every row through the cascade, commit outcomes, correct duplicates and
//! blanks, then summarize.

pub mod summary;

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::matching::predicates::COMBINED_FIELDS;
use crate::matching::{
    FieldComparator, MatchOptions, ProgressConfig, ProgressUpdate, ReferenceSet, Resolver,
    UniquenessIndex, apply_resolutions, resolve_all, validate_matches,
};
use crate::models::Record;
use crate::worksheet::RatingWorksheet;
use summary::{MatchReport, SummaryBuilder};

/// Resolve `worksheet` in place against `reference` and report the outcome.
///
/// The worksheet keeps its length and order; only `candidate_id` and
/// `match_status` are rewritten.
pub fn run_match<F>(
    worksheet: &mut [Record],
    reference: &ReferenceSet,
    comparator: &FieldComparator,
    opts: &MatchOptions,
    on_progress: F,
) -> Result<MatchReport, MatchError>
where
    F: Fn(ProgressUpdate) + Sync,
{
    if worksheet.is_empty() {
        return Err(MatchError::EmptyWorksheet);
    }
    let started = chrono::Utc::now();
    log::info!(
        "Matching {} worksheet rows against {} reference rows ({}, parallel={})",
        worksheet.len(),
        reference.len(),
        comparator.similarity_name(),
        opts.parallel
    );

    let index = UniquenessIndex::build(worksheet, &COMBINED_FIELDS);
    let resolver = Resolver::new(reference.pool(), comparator, &index);
    let resolutions = resolve_all(worksheet, &resolver, opts, on_progress);

    let tally = apply_resolutions(worksheet, &resolutions);
    let validation = validate_matches(worksheet);
    log::info!(
        "Resolved: {} matched, {} for review, {} duplicates, {} unmatched",
        tally.matched,
        tally.review,
        validation.duplicates,
        validation.unmatched
    );

    SummaryBuilder::new(worksheet.len())
        .with_reference(reference.len(), reference.excluded())
        .with_tally(tally)
        .with_validation(validation)
        .with_similarity(comparator.similarity_name())
        .with_timestamps(started, chrono::Utc::now())
        .build()
}

/// Match a loaded worksheet against raw reference rows using `cfg`.
pub fn match_worksheet<F>(
    worksheet: &mut RatingWorksheet,
    reference_rows: Vec<Record>,
    cfg: &MatchingConfig,
    on_progress: F,
) -> Result<MatchReport, MatchError>
where
    F: Fn(ProgressUpdate) + Sync,
{
    if worksheet.is_empty() {
        return Err(MatchError::EmptyWorksheet);
    }
    let reference = ReferenceSet::new(reference_rows)?;
    let comparator = FieldComparator::from_kind(cfg.similarity);
    let opts = MatchOptions {
        parallel: cfg.parallel,
        progress: ProgressConfig {
            update_every: cfg.progress_every,
        },
    };
    run_match(
        worksheet.records_mut(),
        &reference,
        &comparator,
        &opts,
        on_progress,
    )
}
