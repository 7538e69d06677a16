//! Post-match corrections across the whole worksheet.

use crate::models::{MatchStatus, Record};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub duplicates: usize,
    pub unmatched: usize,
}

/// Mark rows sharing a `candidate_id` as `DUPLICATE` (keeping the id) and
/// rows without one as `UNMATCHED`. Overrides whatever status the cascade
/// wrote; running it again changes nothing.
pub fn validate_matches(records: &mut [Record]) -> ValidationSummary {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for rec in records.iter().filter(|r| r.has_candidate_id()) {
        *counts.entry(rec.candidate_id.trim().to_string()).or_insert(0) += 1;
    }

    let mut summary = ValidationSummary::default();
    for rec in records.iter_mut() {
        if !rec.has_candidate_id() {
            rec.candidate_id.clear();
            rec.match_status = Some(MatchStatus::Unmatched);
            summary.unmatched += 1;
        } else if counts.get(rec.candidate_id.trim()).copied().unwrap_or(0) > 1 {
            rec.match_status = Some(MatchStatus::Duplicate);
            summary.duplicates += 1;
        }
    }
    if summary.duplicates > 0 {
        log::warn!(
            "{} rows share a candidate_id with another row",
            summary.duplicates
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, status: Option<MatchStatus>) -> Record {
        Record {
            candidate_id: id.into(),
            match_status: status,
            ..Default::default()
        }
    }

    #[test]
    fn shared_ids_become_duplicates_and_keep_their_id() {
        let mut rows = vec![
            row("42", Some(MatchStatus::LastFirst)),
            row("42", Some(MatchStatus::Review)),
            row("7", Some(MatchStatus::CombinedLast)),
        ];
        let s = validate_matches(&mut rows);
        assert_eq!(s, ValidationSummary { duplicates: 2, unmatched: 0 });
        assert_eq!(rows[0].match_status, Some(MatchStatus::Duplicate));
        assert_eq!(rows[1].match_status, Some(MatchStatus::Duplicate));
        assert_eq!(rows[1].candidate_id, "42");
        assert_eq!(rows[2].match_status, Some(MatchStatus::CombinedLast));
    }

    #[test]
    fn blank_ids_become_unmatched() {
        let mut rows = vec![row("", None), row("  ", None), row("1", Some(MatchStatus::Review))];
        let s = validate_matches(&mut rows);
        assert_eq!(s, ValidationSummary { duplicates: 0, unmatched: 2 });
        assert_eq!(rows[0].match_status, Some(MatchStatus::Unmatched));
        assert_eq!(rows[1].candidate_id, "");
        assert_eq!(rows[2].match_status, Some(MatchStatus::Review));
    }

    #[test]
    fn validation_is_idempotent() {
        let mut rows = vec![
            row("42", Some(MatchStatus::LastFirst)),
            row("", None),
            row("42", Some(MatchStatus::Review)),
            row("5", Some(MatchStatus::LastCrossFirst)),
        ];
        let first = validate_matches(&mut rows);
        let snapshot = rows.clone();
        let second = validate_matches(&mut rows);
        assert_eq!(first, second);
        assert_eq!(rows, snapshot);
    }
}
