use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Columns the worksheet vocabulary knows about. Anything else on an input
/// row is carried through `Record::extra_fields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    LastName,
    FirstName,
    MiddleName,
    Suffix,
    Nickname,
    Party,
    State,
    StateId,
    Office,
    District,
    CandidateId,
    SigRating,
    OurRating,
}

impl Field {
    /// Worksheet vocabulary in canonical column order.
    pub const ALL: [Field; 13] = [
        Field::LastName,
        Field::FirstName,
        Field::MiddleName,
        Field::Suffix,
        Field::Nickname,
        Field::Party,
        Field::State,
        Field::StateId,
        Field::Office,
        Field::District,
        Field::CandidateId,
        Field::SigRating,
        Field::OurRating,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::LastName => "lastname",
            Field::FirstName => "firstname",
            Field::MiddleName => "middlename",
            Field::Suffix => "suffix",
            Field::Nickname => "nickname",
            Field::Party => "party",
            Field::State => "state",
            Field::StateId => "state_id",
            Field::Office => "office",
            Field::District => "district",
            Field::CandidateId => "candidate_id",
            Field::SigRating => "sig_rating",
            Field::OurRating => "our_rating",
        }
    }

    /// Case-insensitive lookup of a column header.
    pub fn from_name(name: &str) -> Option<Field> {
        let key = name.trim().to_ascii_lowercase();
        Field::ALL.into_iter().find(|f| f.name() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column written next to `candidate_id` to say how a row was resolved.
pub const MATCH_STATUS_COLUMN: &str = "match_status";

/// Fixed vocabulary of `match_status` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "LAST_FIRST")]
    LastFirst,
    #[serde(rename = "LAST_COMBINED-FIRST")]
    LastCombinedFirst,
    #[serde(rename = "LAST_FUZZY-FIRST")]
    LastFuzzyFirst,
    #[serde(rename = "COMBINED_LAST_FUZZY-FIRST")]
    CombinedLastFuzzyFirst,
    #[serde(rename = "COMBINED_LAST")]
    CombinedLast,
    #[serde(rename = "LAST_CROSS-FIRST")]
    LastCrossFirst,
    #[serde(rename = "COMBINED_LAST_CROSS-FIRST")]
    CombinedLastCrossFirst,
    #[serde(rename = "LAST_FUZZY-CROSS-FIRST")]
    LastFuzzyCrossFirst,
    #[serde(rename = "COMBINED_LAST_FUZZY-CROSS-FIRST")]
    CombinedLastFuzzyCrossFirst,
    #[serde(rename = "REVIEW")]
    Review,
    #[serde(rename = "DUPLICATE")]
    Duplicate,
    #[serde(rename = "UNMATCHED")]
    Unmatched,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 12] = [
        MatchStatus::LastFirst,
        MatchStatus::LastCombinedFirst,
        MatchStatus::LastFuzzyFirst,
        MatchStatus::CombinedLastFuzzyFirst,
        MatchStatus::CombinedLast,
        MatchStatus::LastCrossFirst,
        MatchStatus::CombinedLastCrossFirst,
        MatchStatus::LastFuzzyCrossFirst,
        MatchStatus::CombinedLastFuzzyCrossFirst,
        MatchStatus::Review,
        MatchStatus::Duplicate,
        MatchStatus::Unmatched,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::LastFirst => "LAST_FIRST",
            MatchStatus::LastCombinedFirst => "LAST_COMBINED-FIRST",
            MatchStatus::LastFuzzyFirst => "LAST_FUZZY-FIRST",
            MatchStatus::CombinedLastFuzzyFirst => "COMBINED_LAST_FUZZY-FIRST",
            MatchStatus::CombinedLast => "COMBINED_LAST",
            MatchStatus::LastCrossFirst => "LAST_CROSS-FIRST",
            MatchStatus::CombinedLastCrossFirst => "COMBINED_LAST_CROSS-FIRST",
            MatchStatus::LastFuzzyCrossFirst => "LAST_FUZZY-CROSS-FIRST",
            MatchStatus::CombinedLastFuzzyCrossFirst => "COMBINED_LAST_FUZZY-CROSS-FIRST",
            MatchStatus::Review => "REVIEW",
            MatchStatus::Duplicate => "DUPLICATE",
            MatchStatus::Unmatched => "UNMATCHED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        MatchStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| format!("unknown match status: {key}"))
    }
}

/// One worksheet or reference row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub lastname: String,
    pub firstname: String,
    pub middlename: String,
    pub suffix: String,
    pub nickname: String,
    pub party: String,
    pub state: String,
    pub state_id: String,
    pub office: String,
    pub district: String,
    pub candidate_id: String,
    pub sig_rating: String,
    pub our_rating: String,
    pub match_status: Option<MatchStatus>,
    #[serde(default)]
    pub extra_fields: HashMap<String, String>, // columns outside the vocabulary, carried through untouched
}

impl Record {
    /// Build a record from header/value pairs. Known headers land in typed
    /// fields; everything else goes to `extra_fields`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut rec = Record::default();
        for (k, v) in pairs {
            rec.set_column(k.as_ref(), v.as_ref());
        }
        rec
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::LastName => &self.lastname,
            Field::FirstName => &self.firstname,
            Field::MiddleName => &self.middlename,
            Field::Suffix => &self.suffix,
            Field::Nickname => &self.nickname,
            Field::Party => &self.party,
            Field::State => &self.state,
            Field::StateId => &self.state_id,
            Field::Office => &self.office,
            Field::District => &self.district,
            Field::CandidateId => &self.candidate_id,
            Field::SigRating => &self.sig_rating,
            Field::OurRating => &self.our_rating,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::LastName => self.lastname = value,
            Field::FirstName => self.firstname = value,
            Field::MiddleName => self.middlename = value,
            Field::Suffix => self.suffix = value,
            Field::Nickname => self.nickname = value,
            Field::Party => self.party = value,
            Field::State => self.state = value,
            Field::StateId => self.state_id = value,
            Field::Office => self.office = value,
            Field::District => self.district = value,
            Field::CandidateId => self.candidate_id = value,
            Field::SigRating => self.sig_rating = value,
            Field::OurRating => self.our_rating = value,
        }
    }

    /// Write a value under an arbitrary column header.
    pub fn set_column(&mut self, name: &str, value: &str) {
        if let Some(field) = Field::from_name(name) {
            self.set(field, value.trim());
        } else if name.trim().eq_ignore_ascii_case(MATCH_STATUS_COLUMN) {
            self.match_status = value.parse().ok();
        } else {
            self.extra_fields.insert(name.to_string(), value.to_string());
        }
    }

    /// Read a value by column header; `None` when the column is unknown to this row.
    pub fn column(&self, name: &str) -> Option<&str> {
        if let Some(field) = Field::from_name(name) {
            Some(self.get(field))
        } else if name.trim().eq_ignore_ascii_case(MATCH_STATUS_COLUMN) {
            Some(self.match_status.map(MatchStatus::as_str).unwrap_or(""))
        } else {
            self.extra_fields.get(name).map(|s| s.as_str())
        }
    }

    pub fn has_candidate_id(&self) -> bool {
        !self.candidate_id.trim().is_empty()
    }
}
