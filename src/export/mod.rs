pub mod csv_export;
pub mod xlsx_export;
pub mod xlsx_import;

use crate::models::Record;
use crate::orchestrator::summary::MatchReport;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Output format selected on the command line or in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Both,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn wants_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }

    pub fn wants_xlsx(self) -> bool {
        matches!(self, Self::Xlsx | Self::Both)
    }
}

/// `out.csv` → `out.xlsx`, `out` → `out.xlsx`.
pub fn with_extension(path: &str, ext: &str) -> String {
    Path::new(path).with_extension(ext).to_string_lossy().into_owned()
}

/// `out.csv` → `out_summary.csv`.
pub fn summary_path(path: &str) -> String {
    let p = Path::new(path);
    let stem = p.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let ext = p.extension().map(|s| s.to_string_lossy()).unwrap_or_else(|| "csv".into());
    p.with_file_name(format!("{stem}_summary.{ext}"))
        .to_string_lossy()
        .into_owned()
}

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_workbook_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Read a headered table, as a workbook or as CSV depending on the extension.
pub fn read_table(path: &str) -> Result<(Vec<String>, Vec<Record>)> {
    if is_workbook_path(path) {
        xlsx_import::read_records_xlsx(path)
    } else {
        csv_export::read_records(path)
    }
}

/// Pretty-printed JSON dump of the report.
pub fn export_report_json(report: &MatchReport, path: &str) -> Result<()> {
    let body = serde_json::to_string_pretty(report)?;
    ensure_parent_dir(path)?;
    fs::write(path, body).with_context(|| format!("writing {path}"))?;
    Ok(())
}

pub fn ensure_parent_dir(path: &str) -> Result<()> {
    let p = Path::new(path);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::parse("XLSX"), Some(OutputFormat::Xlsx));
        assert!(OutputFormat::parse("both").unwrap().wants_csv());
        assert!(OutputFormat::parse("pdf").is_none());
    }

    #[test]
    fn workbook_extensions_pick_the_reader() {
        assert!(is_workbook_path("in/ws.XLSX"));
        assert!(is_workbook_path("ws.ods"));
        assert!(!is_workbook_path("ws.csv"));
        assert!(!is_workbook_path("xlsx"));
    }

    #[test]
    fn ensure_parent_dir_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("report.json");
        ensure_parent_dir(target.to_str().unwrap()).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        ensure_parent_dir("report.json").unwrap();
    }

    #[test]
    fn report_json_lands_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = crate::orchestrator::summary::SummaryBuilder::new(2).build().unwrap();
        let path = dir.path().join("reports").join("2024").join("run.json");
        export_report_json(&report, path.to_str().unwrap()).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["total_rows"], 2);
    }

    #[test]
    fn derived_paths() {
        assert_eq!(with_extension("out/run.csv", "xlsx"), "out/run.xlsx");
        assert_eq!(summary_path("out/run.csv"), "out/run_summary.csv");
        assert_eq!(summary_path("run"), "run_summary.csv");
    }
}
