//! Cascading per-row resolution.
//!
//! Each worksheet row walks a small state machine:
//!
//! ```text
//! Start -> LastFiltered -> { Resolved, Ambiguous, Unresolved }
//! ```
//!
//! The last-name filter picks the branch. A single last-name candidate is
//! confirmed by the [`SINGLE_CANDIDATE_STEPS`] table and falls back to a
//! `REVIEW` commitment when none of them confirm it. Several last-name
//! candidates are narrowed by the [`MULTI_CANDIDATE_STEPS`] table; when no
//! step narrows to exactly one the row is left [`CascadeState::Ambiguous`]
//! and gets no identifier at all.
//!
//! **Asymmetry:** the single-candidate branch always commits (as `REVIEW`
//! when unconfirmed) while the multi-candidate branch never guesses. This is
//! current policy and is pinned by tests; do not unify the two without a
//! product decision.

use crate::matching::comparator::FieldComparator;
use crate::matching::predicates::{COMBINED_FIELDS, combined, cross, match_field};
use crate::matching::uniqueness::UniquenessIndex;
use crate::models::{Field, MatchStatus, Record};
use crate::normalize::normalize_text;
use std::collections::HashMap;

/// Threshold of the last-name filter that opens every cascade. At 1.0 the
/// filter is normalized equality, served from [`Resolver`]'s surname index.
pub const LAST_NAME_THRESHOLD: f64 = 1.0;

/// Reference fields a worksheet first name is cross-checked against.
pub const CROSS_FIELDS: [Field; 2] = [Field::Nickname, Field::MiddleName];

/// Narrowing applied by one cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `match` on the first name.
    FirstName,
    /// `cross` from the first name to nickname and middle name.
    CrossFirst,
    /// `combined` over [`COMBINED_FIELDS`].
    Combined,
}

/// `combined` pass run over a step's output when it kept several candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub threshold: f64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeStep {
    pub predicate: Predicate,
    pub threshold: f64,
    pub status: MatchStatus,
    pub refine: Option<Refinement>,
}

const fn step(
    predicate: Predicate,
    threshold: f64,
    status: MatchStatus,
    refine: Option<Refinement>,
) -> CascadeStep {
    CascadeStep {
        predicate,
        threshold,
        status,
        refine,
    }
}

const fn refine(threshold: f64, status: MatchStatus) -> Option<Refinement> {
    Some(Refinement { threshold, status })
}

/// Confirmation order when the last name picks exactly one candidate.
pub const SINGLE_CANDIDATE_STEPS: &[CascadeStep] = &[
    step(Predicate::FirstName, 0.7, MatchStatus::LastFuzzyFirst, None),
    step(Predicate::Combined, 0.6, MatchStatus::CombinedLast, None),
    step(Predicate::CrossFirst, 0.8, MatchStatus::LastCrossFirst, None),
];

/// Narrowing order when the last name picks several candidates.
pub const MULTI_CANDIDATE_STEPS: &[CascadeStep] = &[
    step(
        Predicate::FirstName,
        1.0,
        MatchStatus::LastFirst,
        refine(0.6, MatchStatus::LastCombinedFirst),
    ),
    step(
        Predicate::FirstName,
        0.7,
        MatchStatus::LastFuzzyFirst,
        refine(0.5, MatchStatus::CombinedLastFuzzyFirst),
    ),
    step(Predicate::Combined, 0.6, MatchStatus::CombinedLast, None),
    step(
        Predicate::CrossFirst,
        1.0,
        MatchStatus::LastCrossFirst,
        refine(0.6, MatchStatus::CombinedLastCrossFirst),
    ),
    step(
        Predicate::CrossFirst,
        0.8,
        MatchStatus::LastFuzzyCrossFirst,
        refine(0.6, MatchStatus::CombinedLastFuzzyCrossFirst),
    ),
];

/// Per-row cascade state.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeState<'a> {
    Start,
    LastFiltered(Vec<&'a Record>),
    Resolved {
        candidate: &'a Record,
        status: MatchStatus,
    },
    /// Several last-name candidates and no step singled one out.
    Ambiguous(Vec<&'a Record>),
    /// No candidate shares the last name.
    Unresolved,
}

impl CascadeState<'_> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CascadeState::Start | CascadeState::LastFiltered(_))
    }
}

/// Final outcome for one row. An identifier is only ever produced together
/// with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        candidate_id: String,
        status: MatchStatus,
    },
    Unresolved,
}

impl Resolution {
    pub fn status(&self) -> Option<MatchStatus> {
        match self {
            Resolution::Resolved { status, .. } => Some(*status),
            Resolution::Unresolved => None,
        }
    }

    pub fn candidate_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { candidate_id, .. } => Some(candidate_id),
            Resolution::Unresolved => None,
        }
    }

    /// Write identifier and status onto `record` together, clearing both
    /// when unresolved.
    pub fn commit(&self, record: &mut Record) {
        match self {
            Resolution::Resolved {
                candidate_id,
                status,
            } => {
                record.candidate_id = candidate_id.clone();
                record.match_status = Some(*status);
            }
            Resolution::Unresolved => {
                record.candidate_id.clear();
                record.match_status = None;
            }
        }
    }
}

impl From<CascadeState<'_>> for Resolution {
    fn from(state: CascadeState<'_>) -> Self {
        match state {
            CascadeState::Resolved { candidate, status } => Resolution::Resolved {
                candidate_id: candidate.candidate_id.clone(),
                status,
            },
            _ => Resolution::Unresolved,
        }
    }
}

/// Runs the cascade for worksheet rows against a fixed candidate pool.
#[derive(Debug)]
pub struct Resolver<'a> {
    pool: Vec<&'a Record>,
    /// Normalized last name -> pool positions, in pool order.
    by_last_name: HashMap<String, Vec<usize>>,
    comparator: &'a FieldComparator,
    index: &'a UniquenessIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(
        pool: Vec<&'a Record>,
        comparator: &'a FieldComparator,
        index: &'a UniquenessIndex,
    ) -> Self {
        let mut by_last_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, rec) in pool.iter().enumerate() {
            by_last_name
                .entry(normalize_text(&rec.lastname))
                .or_default()
                .push(i);
        }
        Self {
            pool,
            by_last_name,
            comparator,
            index,
        }
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn resolve(&self, row: &Record) -> Resolution {
        self.run(row).into()
    }

    /// Drive `row` from `Start` to a terminal state.
    pub fn run(&self, row: &Record) -> CascadeState<'a> {
        let mut state = CascadeState::Start;
        while !state.is_terminal() {
            state = self.advance(state, row);
        }
        state
    }

    /// One state transition.
    pub fn advance(&self, state: CascadeState<'a>, row: &Record) -> CascadeState<'a> {
        match state {
            CascadeState::Start => CascadeState::LastFiltered(self.last_name_candidates(row)),
            CascadeState::LastFiltered(last) => match last.len() {
                0 => CascadeState::Unresolved,
                1 => {
                    let (candidate, status) = self
                        .first_unique(SINGLE_CANDIDATE_STEPS, &last, row)
                        .unwrap_or((last[0], MatchStatus::Review));
                    CascadeState::Resolved { candidate, status }
                }
                _ => match self.first_unique(MULTI_CANDIDATE_STEPS, &last, row) {
                    Some((candidate, status)) => CascadeState::Resolved { candidate, status },
                    None => CascadeState::Ambiguous(last),
                },
            },
            terminal => terminal,
        }
    }

    /// Pool entries whose last name equals the row's after normalization.
    pub fn last_name_candidates(&self, row: &Record) -> Vec<&'a Record> {
        self.by_last_name
            .get(&normalize_text(&row.lastname))
            .map(|ix| ix.iter().map(|&i| self.pool[i]).collect())
            .unwrap_or_default()
    }

    /// Evaluate `steps` in order and return the first single candidate.
    pub fn first_unique(
        &self,
        steps: &[CascadeStep],
        pool: &[&'a Record],
        row: &Record,
    ) -> Option<(&'a Record, MatchStatus)> {
        steps.iter().find_map(|s| self.apply_step(s, pool, row))
    }

    /// Apply one step, running its refinement only over a multi-candidate result.
    pub fn apply_step(
        &self,
        step: &CascadeStep,
        pool: &[&'a Record],
        row: &Record,
    ) -> Option<(&'a Record, MatchStatus)> {
        let narrowed = self.narrow(step.predicate, pool, row, step.threshold);
        match narrowed.as_slice() {
            [] => None,
            [only] => Some((*only, step.status)),
            _ => {
                let r = step.refine?;
                match self.narrow(Predicate::Combined, &narrowed, row, r.threshold).as_slice() {
                    [only] => Some((*only, r.status)),
                    _ => None,
                }
            }
        }
    }

    fn narrow(
        &self,
        predicate: Predicate,
        pool: &[&'a Record],
        row: &Record,
        threshold: f64,
    ) -> Vec<&'a Record> {
        match predicate {
            Predicate::FirstName => {
                match_field(pool, row, Field::FirstName, threshold, self.comparator)
            }
            Predicate::CrossFirst => cross(
                pool,
                row,
                Field::FirstName,
                &CROSS_FIELDS,
                threshold,
                self.comparator,
            ),
            Predicate::Combined => combined(
                pool,
                row,
                &COMBINED_FIELDS,
                self.index,
                threshold,
                self.comparator,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: &str, last: &str, first: &str) -> Record {
        Record {
            candidate_id: id.into(),
            lastname: last.into(),
            firstname: first.into(),
            ..Default::default()
        }
    }

    fn with_state(mut rec: Record, state: &str) -> Record {
        rec.state = state.into();
        rec
    }

    fn with_nick(mut rec: Record, nick: &str) -> Record {
        rec.nickname = nick.into();
        rec
    }

    /// Resolve `row` against `refs`, indexing uniqueness over `worksheet`.
    fn resolve_in(refs: &[Record], worksheet: &[Record], row: &Record) -> Resolution {
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::build(worksheet, &COMBINED_FIELDS);
        let resolver = Resolver::new(refs.iter().collect(), &cmp, &idx);
        resolver.resolve(row)
    }

    fn resolve_one(refs: &[Record], row: Record) -> Resolution {
        resolve_in(refs, std::slice::from_ref(&row), &row)
    }

    fn resolved(id: &str, status: MatchStatus) -> Resolution {
        Resolution::Resolved {
            candidate_id: id.into(),
            status,
        }
    }

    #[test]
    fn surname_index_agrees_with_exact_last_name_match() {
        let refs = [
            r("1", "Smith", "John"),
            r("2", "  SMITH ", "Jon"),
            r("3", "Muñoz", "Ana"),
            r("4", "", "Nobody"),
            r("5", "Smyth", "John"),
            r("6", "smith", "Peter"),
        ];
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::default();
        let pool: Vec<&Record> = refs.iter().collect();
        let resolver = Resolver::new(pool.clone(), &cmp, &idx);
        for last in ["Smith", "munoz", "", "Smyth", "Jones"] {
            let row = r("", last, "");
            let ids = |v: Vec<&Record>| -> Vec<String> {
                v.iter().map(|c| c.candidate_id.clone()).collect()
            };
            assert_eq!(
                ids(resolver.last_name_candidates(&row)),
                ids(match_field(&pool, &row, Field::LastName, LAST_NAME_THRESHOLD, &cmp)),
                "last name {last:?}"
            );
        }
        assert_eq!(resolver.last_name_candidates(&r("", "Smith", "")).len(), 3);
    }

    #[test]
    fn single_candidate_exact_first_name_is_fuzzy_first() {
        let refs = [r("42", "Smith", "John")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "John")),
            resolved("42", MatchStatus::LastFuzzyFirst)
        );
    }

    #[test]
    fn single_candidate_falls_back_to_combined() {
        let refs = [with_state(r("7", "Smith", "Robert"), "NY")];
        let row = with_state(r("", "Smith", "Peter"), "ny");
        assert_eq!(resolve_one(&refs, row), resolved("7", MatchStatus::CombinedLast));
    }

    #[test]
    fn single_candidate_falls_back_to_cross() {
        let refs = [with_nick(r("7", "Smith", "Robert"), "Bob")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "Bob")),
            resolved("7", MatchStatus::LastCrossFirst)
        );
    }

    #[test]
    fn single_candidate_without_confirmation_commits_as_review() {
        let refs = [r("7", "Smith", "Peter")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "John")),
            resolved("7", MatchStatus::Review)
        );
    }

    #[test]
    fn no_last_name_match_is_unresolved() {
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::default();
        let refs = [r("1", "Jones", "John")];
        let resolver = Resolver::new(refs.iter().collect(), &cmp, &idx);
        assert_eq!(resolver.run(&r("", "Smith", "John")), CascadeState::Unresolved);
        assert_eq!(resolver.resolve(&r("", "Smith", "John")), Resolution::Unresolved);
    }

    #[test]
    fn empty_pool_is_unresolved() {
        assert_eq!(resolve_one(&[], r("", "Smith", "John")), Resolution::Unresolved);
    }

    #[test]
    fn multi_candidate_without_first_name_stays_ambiguous() {
        let refs = [r("1", "Jones", "Alice"), r("2", "Jones", "Susan")];
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::default();
        let resolver = Resolver::new(refs.iter().collect(), &cmp, &idx);
        let row = r("", "Jones", "");
        assert!(matches!(resolver.run(&row), CascadeState::Ambiguous(ref c) if c.len() == 2));
        assert_eq!(resolver.resolve(&row), Resolution::Unresolved);
    }

    #[test]
    fn irreducible_ambiguity_is_handled_asymmetrically() {
        // One last-name candidate: committed for review.
        let single = [r("1", "Jones", "Alice")];
        assert_eq!(
            resolve_one(&single, r("", "Jones", "")),
            resolved("1", MatchStatus::Review)
        );
        // Two last-name candidates: left without identifier or status.
        let multi = [r("1", "Jones", "Alice"), r("2", "Jones", "Susan")];
        assert_eq!(resolve_one(&multi, r("", "Jones", "")), Resolution::Unresolved);
    }

    #[test]
    fn multi_candidate_exact_first_name() {
        let refs = [r("1", "Smith", "John"), r("2", "Smith", "Peter")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "john")),
            resolved("1", MatchStatus::LastFirst)
        );
    }

    #[test]
    fn first_step_in_priority_order_wins() {
        let refs = [
            with_state(r("1", "Smith", "John"), "NY"),
            with_state(r("2", "Smith", "Peter"), "CA"),
        ];
        let row = with_state(r("", "Smith", "John"), "NY");
        // Combined alone would single out the same candidate.
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::build(std::slice::from_ref(&row), &COMBINED_FIELDS);
        let resolver = Resolver::new(refs.iter().collect(), &cmp, &idx);
        let pool: Vec<&Record> = refs.iter().collect();
        let combined_step = MULTI_CANDIDATE_STEPS[2];
        assert_eq!(combined_step.status, MatchStatus::CombinedLast);
        assert!(resolver.apply_step(&combined_step, &pool, &row).is_some());

        assert_eq!(resolver.resolve(&row), resolved("1", MatchStatus::LastFirst));
    }

    #[test]
    fn multi_candidate_combined_refines_exact_first_name() {
        let refs = [
            with_state(r("1", "Smith", "John"), "NY"),
            with_state(r("2", "Smith", "John"), "CA"),
        ];
        let row = with_state(r("", "Smith", "John"), "CA");
        assert_eq!(
            resolve_one(&refs, row),
            resolved("2", MatchStatus::LastCombinedFirst)
        );
    }

    #[test]
    fn multi_candidate_fuzzy_first_name() {
        let refs = [r("1", "Smith", "Jon"), r("2", "Smith", "Peter")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "John")),
            resolved("1", MatchStatus::LastFuzzyFirst)
        );
    }

    #[test]
    fn multi_candidate_combined_refines_fuzzy_first_name() {
        let refs = [
            with_state(r("1", "Smith", "Jon"), "NY"),
            with_state(r("2", "Smith", "Jonn"), "CA"),
            r("3", "Smith", "Peter"),
        ];
        let row = with_state(r("", "Smith", "John"), "CA");
        assert_eq!(
            resolve_one(&refs, row),
            resolved("2", MatchStatus::CombinedLastFuzzyFirst)
        );
    }

    #[test]
    fn multi_candidate_combined_on_last_name_set() {
        let refs = [
            with_state(r("1", "Smith", "John"), "NY"),
            with_state(r("2", "Smith", "Peter"), "CA"),
        ];
        let row = with_state(r("", "Smith", ""), "NY");
        assert_eq!(resolve_one(&refs, row), resolved("1", MatchStatus::CombinedLast));
    }

    #[test]
    fn multi_candidate_cross_first_name() {
        let refs = [with_nick(r("1", "Smith", "Robert"), "Bob"), r("2", "Smith", "Peter")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "Bob")),
            resolved("1", MatchStatus::LastCrossFirst)
        );
    }

    #[test]
    fn multi_candidate_combined_refines_cross() {
        let refs = [
            with_state(with_nick(r("1", "Smith", "Robert"), "Bob"), "NY"),
            with_state(with_nick(r("2", "Smith", "Roberto"), "Bob"), "TX"),
            // Shares the state, so combined over the whole last-name set stays ambiguous.
            with_state(r("3", "Smith", "Peter"), "TX"),
        ];
        let row = with_state(r("", "Smith", "Bob"), "TX");
        assert_eq!(
            resolve_one(&refs, row),
            resolved("2", MatchStatus::CombinedLastCrossFirst)
        );
    }

    #[test]
    fn multi_candidate_fuzzy_cross_first_name() {
        let refs = [with_nick(r("1", "Smith", "Robert"), "Bobby"), r("2", "Smith", "Peter")];
        assert_eq!(
            resolve_one(&refs, r("", "Smith", "Bob")),
            resolved("1", MatchStatus::LastFuzzyCrossFirst)
        );
    }

    #[test]
    fn refinement_never_runs_on_empty_step_output() {
        let cmp = FieldComparator::default();
        let idx = UniquenessIndex::default();
        let refs = [with_state(r("1", "Smith", "Peter"), "NY")];
        let resolver = Resolver::new(refs.iter().collect(), &cmp, &idx);
        let pool: Vec<&Record> = refs.iter().collect();
        let row = with_state(r("", "Smith", "John"), "NY");
        // The exact first-name step keeps nobody, so its combined refinement
        // must not rescue the state-only agreement.
        assert_eq!(resolver.apply_step(&MULTI_CANDIDATE_STEPS[0], &pool, &row), None);
    }

    #[test]
    fn step_tables_follow_policy_order() {
        let multi: Vec<MatchStatus> = MULTI_CANDIDATE_STEPS.iter().map(|s| s.status).collect();
        assert_eq!(
            multi,
            [
                MatchStatus::LastFirst,
                MatchStatus::LastFuzzyFirst,
                MatchStatus::CombinedLast,
                MatchStatus::LastCrossFirst,
                MatchStatus::LastFuzzyCrossFirst,
            ]
        );
        let single: Vec<MatchStatus> = SINGLE_CANDIDATE_STEPS.iter().map(|s| s.status).collect();
        assert_eq!(
            single,
            [
                MatchStatus::LastFuzzyFirst,
                MatchStatus::CombinedLast,
                MatchStatus::LastCrossFirst,
            ]
        );
        assert!(SINGLE_CANDIDATE_STEPS.iter().all(|s| s.refine.is_none()));
    }

    #[test]
    fn commit_writes_id_and_status_together() {
        let mut rec = r("stale", "Smith", "John");
        resolved("9", MatchStatus::LastFirst).commit(&mut rec);
        assert_eq!(rec.candidate_id, "9");
        assert_eq!(rec.match_status, Some(MatchStatus::LastFirst));
        Resolution::Unresolved.commit(&mut rec);
        assert!(rec.candidate_id.is_empty());
        assert_eq!(rec.match_status, None);
    }
}
