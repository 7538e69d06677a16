use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matching::SimilarityKind;
use crate::worksheet::KeepColumns;

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct InputConfig {
    /// One or more worksheet files; rows are concatenated in order.
    pub worksheets: Vec<String>,
    /// Reference export (rows carrying candidate_id).
    pub reference: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    #[serde(default)]
    pub similarity: SimilarityKind,
    #[serde(default)]
    pub parallel: bool,
    pub progress_every: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityKind::JaroWinkler,
            parallel: false,
            progress_every: 500,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: Option<String>,
    pub format: Option<String>, // csv|xlsx|both
    #[serde(default)]
    pub keep_columns: KeepColumns,
    /// Optional JSON dump of the metrics report.
    pub report_json: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: None,
            format: Some("csv".into()),
            keep_columns: KeepColumns::All,
            report_json: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.worksheets.iter().all(|w| w.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: "input.worksheets",
            });
        }
        if self.input.reference.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.reference",
            });
        }
        match self.export.out_path.as_deref() {
            Some(p) if !p.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingField {
                    field: "export.out_path",
                });
            }
        }
        if let Some(ref fmt) = self.export.format {
            match fmt.as_str() {
                "csv" | "xlsx" | "both" => {}
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "export.format",
                        reason: format!("unsupported: {}", other),
                    });
                }
            }
        }
        if self.matching.progress_every == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.progress_every",
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

pub const SPAN_FIRST_YEAR: u32 = 1989;
pub const SPAN_LAST_YEAR: u32 = 3000;

fn is_span_year(s: &str) -> bool {
    s.len() == 4
        && s.bytes().all(|b| b.is_ascii_digit())
        && s.parse::<u32>()
            .is_ok_and(|y| (SPAN_FIRST_YEAR..=SPAN_LAST_YEAR).contains(&y))
}

/// `YYYY` or `YYYY-YYYY`, every year within 1989..=3000.
pub fn is_valid_span(span: &str) -> bool {
    match span.trim().split_once('-') {
        Some((from, to)) => is_span_year(from) && is_span_year(to),
        None => is_span_year(span.trim()),
    }
}

/// Constant columns stamped on every harvest row.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct HarvestConfig {
    pub worksheets: Vec<String>,
    pub out_path: String,
    pub format: Option<String>, // csv|xlsx|both
    pub span: String,
    pub sig_id: String,
    pub usesigrating: String,
    pub ratingsession: String,
    pub ratingformat_id: String,
    pub number_of_rows: usize,
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.out_path.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "out_path" });
        }
        if !is_valid_span(&self.span) {
            return Err(ConfigError::InvalidValue {
                field: "span",
                reason: format!(
                    "'{}' is not a year or YYYY-YYYY range between {} and {}",
                    self.span, SPAN_FIRST_YEAR, SPAN_LAST_YEAR
                ),
            });
        }
        if !matches!(self.usesigrating.as_str(), "t" | "f") {
            return Err(ConfigError::InvalidValue {
                field: "usesigrating",
                reason: format!("'{}' must be t (SIG rating) or f (our rating)", self.usesigrating),
            });
        }
        if let Some(ref fmt) = self.format {
            if !matches!(fmt.as_str(), "csv" | "xlsx" | "both") {
                return Err(ConfigError::InvalidValue {
                    field: "format",
                    reason: format!("unsupported: {}", fmt),
                });
            }
        }
        if self.worksheets.is_empty() && self.number_of_rows == 0 {
            return Err(ConfigError::InvalidValue {
                field: "number_of_rows",
                reason: "must be > 0 when no worksheet is given".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            input: InputConfig {
                worksheets: vec!["ws.csv".into()],
                reference: "ref.csv".into(),
            },
            matching: MatchingConfig::default(),
            export: ExportConfig {
                out_path: Some("out.csv".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_inputs_are_reported() {
        let mut c = valid();
        c.input.worksheets.clear();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingField { field: "input.worksheets" })
        ));
        let mut c = valid();
        c.input.reference = " ".into();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MissingField { field: "input.reference" })
        ));
    }

    #[test]
    fn bad_format_and_progress_are_rejected() {
        let mut c = valid();
        c.export.format = Some("pdf".into());
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { field: "export.format", .. })
        ));
        let mut c = valid();
        c.matching.progress_every = 0;
        assert!(c.validate().is_err());
    }

    fn harvest() -> HarvestConfig {
        HarvestConfig {
            out_path: "h.csv".into(),
            span: "2024".into(),
            usesigrating: "t".into(),
            number_of_rows: 10,
            ..Default::default()
        }
    }

    #[test]
    fn harvest_needs_rows_or_worksheet() {
        assert!(harvest().validate().is_ok());
        let h = HarvestConfig {
            number_of_rows: 0,
            ..harvest()
        };
        assert!(matches!(
            h.validate(),
            Err(ConfigError::InvalidValue { field: "number_of_rows", .. })
        ));
    }

    #[test]
    fn harvest_span_must_be_a_year_or_range() {
        for ok in ["1989", "2024", "3000", "2021-2022", " 2023 "] {
            assert!(is_valid_span(ok), "{ok}");
        }
        for bad in ["1988", "3001", "24", "2021-", "2021-22", "20x1", "", "2021-2022-2023"] {
            assert!(!is_valid_span(bad), "{bad}");
        }
        let h = HarvestConfig {
            span: "1988".into(),
            ..harvest()
        };
        assert!(matches!(
            h.validate(),
            Err(ConfigError::InvalidValue { field: "span", .. })
        ));
        let h = HarvestConfig {
            span: "2021-2022".into(),
            ..harvest()
        };
        assert!(h.validate().is_ok());
    }

    #[test]
    fn harvest_usesigrating_is_t_or_f() {
        let h = HarvestConfig {
            usesigrating: "x".into(),
            ..harvest()
        };
        assert!(matches!(
            h.validate(),
            Err(ConfigError::InvalidValue { field: "usesigrating", .. })
        ));
        let h = HarvestConfig {
            usesigrating: "f".into(),
            format: Some("xlsx".into()),
            ..harvest()
        };
        assert!(h.validate().is_ok());
    }
}
