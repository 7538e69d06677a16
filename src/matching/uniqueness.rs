//! Worksheet-wide uniqueness of field values.
//!
//! A value that occurs exactly once in the worksheet is strong corroborating
//! evidence when it also appears on a candidate, so `combined` weighs it more.

use crate::models::{Field, Record};
use crate::normalize::normalize_text;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct UniquenessIndex {
    unique: HashMap<Field, HashSet<String>>,
}

impl UniquenessIndex {
    /// Index `fields` over `records`. Empty values are never unique.
    pub fn build(records: &[Record], fields: &[Field]) -> Self {
        let mut unique = HashMap::with_capacity(fields.len());
        for &field in fields {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for rec in records {
                let v = normalize_text(rec.get(field));
                if v.is_empty() {
                    continue;
                }
                *counts.entry(v).or_insert(0) += 1;
            }
            let singles: HashSet<String> = counts
                .into_iter()
                .filter_map(|(v, n)| (n == 1).then_some(v))
                .collect();
            unique.insert(field, singles);
        }
        Self { unique }
    }

    pub fn is_unique(&self, field: Field, value: &str) -> bool {
        let v = normalize_text(value);
        !v.is_empty() && self.unique.get(&field).is_some_and(|set| set.contains(&v))
    }

    pub fn unique_values(&self, field: Field) -> Option<&HashSet<String>> {
        self.unique.get(&field)
    }
}
