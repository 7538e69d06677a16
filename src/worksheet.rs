//! Rating worksheet: the ordered rows to resolve plus the column layout they
//! arrived with.

use crate::error::WorksheetError;
use crate::export::read_table;
use crate::models::{Field, MATCH_STATUS_COLUMN, Record};
use serde::{Deserialize, Serialize};

/// Which pass-through (not required) columns survive to the export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepColumns {
    #[default]
    All,
    None,
    Selected(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorksheetInfo {
    pub number_of_columns: usize,
    pub number_of_rows: usize,
    pub columns_not_required: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RatingWorksheet {
    records: Vec<Record>,
    columns: Vec<String>,
    keep: KeepColumns,
}

fn is_required(column: &str) -> bool {
    Field::from_name(column).is_some() || column.trim().eq_ignore_ascii_case(MATCH_STATUS_COLUMN)
}

impl RatingWorksheet {
    /// `columns` is the input header order, used to order pass-through columns.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            records,
            columns,
            keep: KeepColumns::All,
        }
    }

    /// Worksheet whose layout is just the vocabulary.
    pub fn from_records(records: Vec<Record>) -> Self {
        let columns = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        Self::new(columns, records)
    }

    /// Read and concatenate worksheet files (CSV or workbook) in order.
    pub fn read(paths: &[String]) -> Result<Self, WorksheetError> {
        let mut out = RatingWorksheet::default();
        for path in paths {
            let (columns, records) = read_table(path).map_err(|e| WorksheetError::Read {
                path: path.clone(),
                reason: format!("{e:#}"),
            })?;
            log::info!("Loaded {} worksheet rows from {}", records.len(), path);
            out.append(RatingWorksheet::new(columns, records));
        }
        if out.is_empty() {
            return Err(WorksheetError::Empty {
                files: paths.join(", "),
            });
        }
        Ok(out)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Concatenate another worksheet below this one. New columns are
    /// appended to the layout in the order they first appear.
    pub fn append(&mut self, other: RatingWorksheet) {
        for c in other.columns {
            if !self.columns.iter().any(|x| x == &c) {
                self.columns.push(c);
            }
        }
        self.records.extend(other.records);
    }

    /// Input columns outside the worksheet vocabulary.
    pub fn not_required_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !is_required(c))
            .cloned()
            .collect()
    }

    pub fn worksheet_info(&self) -> WorksheetInfo {
        WorksheetInfo {
            number_of_columns: self.columns.len(),
            number_of_rows: self.records.len(),
            columns_not_required: self.not_required_columns(),
        }
    }

    pub fn keep_columns(&mut self, keep: KeepColumns) {
        if let KeepColumns::Selected(ref wanted) = keep {
            let available = self.not_required_columns();
            for w in wanted.iter().filter(|w| !available.contains(w)) {
                log::warn!("Ignoring unknown pass-through column '{}'", w);
            }
        }
        self.keep = keep;
    }

    /// Pass-through columns that will be exported, in input order.
    pub fn kept_columns(&self) -> Vec<String> {
        let extra = self.not_required_columns();
        match &self.keep {
            KeepColumns::All => extra,
            KeepColumns::None => Vec::new(),
            KeepColumns::Selected(sel) => extra.into_iter().filter(|c| sel.contains(c)).collect(),
        }
    }

    /// Export layout: vocabulary, then `match_status`, then kept columns.
    pub fn output_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        cols.push(MATCH_STATUS_COLUMN.to_string());
        cols.extend(self.kept_columns());
        cols
    }

    /// Values of `rec` laid out as [`output_columns`](Self::output_columns).
    pub fn row_values(&self, rec: &Record, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|c| rec.column(c).unwrap_or("").to_string())
            .collect()
    }

    /// Rebuild as a blank-able template: only vocabulary columns are kept and
    /// the sheet is padded with empty rows up to `number_of_rows`. Never
    /// drops existing rows.
    pub fn generate(&mut self, number_of_rows: usize) {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .map(|r| {
                let mut t = Record::default();
                for f in Field::ALL {
                    t.set(f, r.get(f));
                }
                t
            })
            .collect();
        if records.len() < number_of_rows {
            records.resize_with(number_of_rows, Record::default);
        }
        self.records = records;
        self.columns = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        self.keep = KeepColumns::None;
    }
}
