use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("worksheet is empty; nothing to match")]
    EmptyWorksheet,
    #[error("none of the {rows} reference rows carries a candidate_id")]
    MissingIdentifiers { rows: usize },
}

#[derive(Debug, Error)]
pub enum WorksheetError {
    #[error("no rows found in {files}")]
    Empty { files: String },
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
    #[error("xlsx export error: {0}")]
    Xlsx(String),
}
