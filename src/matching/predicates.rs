//! Candidate narrowing predicates.
//!
//! Every predicate takes a candidate slice and returns the subset that passes,
//! in the original relative order. None of them mutate their inputs or fail.

use crate::matching::comparator::FieldComparator;
use crate::matching::uniqueness::UniquenessIndex;
use crate::models::{Field, Record};

/// Fields corroborated by `combined`.
pub const COMBINED_FIELDS: [Field; 4] = [Field::State, Field::Party, Field::District, Field::Office];

pub const BASE_WEIGHT: f64 = 1.0;
pub const UNIQUE_WEIGHT: f64 = 2.0;

/// Candidates whose `field` matches the row's `field` at `threshold`.
pub fn match_field<'a>(
    candidates: &[&'a Record],
    row: &Record,
    field: Field,
    threshold: f64,
    cmp: &FieldComparator,
) -> Vec<&'a Record> {
    let wanted = row.get(field);
    candidates
        .iter()
        .copied()
        .filter(|c| cmp.matches(wanted, c.get(field), threshold))
        .collect()
}

/// Candidates where the row's `primary` value matches any of the candidate's
/// `alternates`. Empty alternates on the candidate are skipped: a missing
/// nickname is not a name variant.
pub fn cross<'a>(
    candidates: &[&'a Record],
    row: &Record,
    primary: Field,
    alternates: &[Field],
    threshold: f64,
    cmp: &FieldComparator,
) -> Vec<&'a Record> {
    let wanted = row.get(primary);
    candidates
        .iter()
        .copied()
        .filter(|c| {
            alternates.iter().any(|&alt| {
                let v = c.get(alt);
                !v.trim().is_empty() && cmp.matches(wanted, v, threshold)
            })
        })
        .collect()
}

/// Weighted agreement of `candidate` with `row` over `fields`, in `0.0..=1.0`.
///
/// Only fields the row actually fills take part. A row value that is unique
/// in the worksheet weighs [`UNIQUE_WEIGHT`], otherwise [`BASE_WEIGHT`].
pub fn combined_score(
    candidate: &Record,
    row: &Record,
    fields: &[Field],
    index: &UniquenessIndex,
    cmp: &FieldComparator,
) -> f64 {
    let mut total = 0.0;
    let mut agreed = 0.0;
    for &field in fields {
        let wanted = row.get(field);
        if wanted.trim().is_empty() {
            continue;
        }
        let weight = if index.is_unique(field, wanted) {
            UNIQUE_WEIGHT
        } else {
            BASE_WEIGHT
        };
        total += weight;
        if cmp.matches(wanted, candidate.get(field), 1.0) {
            agreed += weight;
        }
    }
    if total == 0.0 { 0.0 } else { agreed / total }
}

/// Candidates whose [`combined_score`] reaches `threshold`.
pub fn combined<'a>(
    candidates: &[&'a Record],
    row: &Record,
    fields: &[Field],
    index: &UniquenessIndex,
    threshold: f64,
    cmp: &FieldComparator,
) -> Vec<&'a Record> {
    candidates
        .iter()
        .copied()
        .filter(|c| combined_score(c, row, fields, index, cmp) >= threshold)
        .collect()
}
