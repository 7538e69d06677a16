use crate::error::ExportError;
use crate::export::ensure_parent_dir;
use crate::harvest::{HARVEST_COLUMNS, HarvestRow};
use crate::models::Record;
use crate::orchestrator::summary::MatchReport;
use crate::worksheet::RatingWorksheet;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter};

const BUF_CAPACITY: usize = 512 * 1024;

fn create_writer(path: &str) -> Result<Writer<BufWriter<File>>> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let buf_writer = BufWriter::with_capacity(BUF_CAPACITY, file);
    Ok(WriterBuilder::new().from_writer(buf_writer))
}

/// Read a headered CSV into records, returning the header order too.
/// Short rows are padded with empty values.
pub fn read_records(path: &str) -> Result<(Vec<String>, Vec<Record>)> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::with_capacity(BUF_CAPACITY, file));
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("{path}: row {}", i + 2))?;
        let rec = Record::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(c, h)| (h.as_str(), row.get(c).unwrap_or(""))),
        );
        records.push(rec);
    }
    log::debug!("Read {} rows x {} columns from {}", records.len(), headers.len(), path);
    Ok((headers, records))
}

/// Write the enriched worksheet: vocabulary, `match_status`, kept columns.
pub fn export_worksheet_csv(worksheet: &RatingWorksheet, path: &str) -> Result<()> {
    let columns = worksheet.output_columns();
    let mut w = create_writer(path)?;
    w.write_record(&columns)?;
    for rec in worksheet.records() {
        w.write_record(worksheet.row_values(rec, &columns))?;
    }
    w.flush()
        .map_err(|e| ExportError::Csv(format!("{path}: {e}")))?;
    Ok(())
}

fn report_value(key: &str, v: f64) -> String {
    if key == "Score (%)" {
        format!("{v:.2}")
    } else {
        format!("{}", v as u64)
    }
}

/// Key/Value rows for the match report.
pub fn report_rows(report: &MatchReport) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = report
        .entries()
        .into_iter()
        .map(|(k, v)| (k.to_string(), report_value(k, v)))
        .collect();
    for (status, n) in &report.by_status {
        rows.push((format!("Method {status}"), n.to_string()));
    }
    rows.push(("Similarity".into(), report.similarity.clone()));
    rows.push(("Started (UTC)".into(), report.started_utc.to_rfc3339()));
    rows.push(("Ended (UTC)".into(), report.ended_utc.to_rfc3339()));
    rows.push(("Duration (s)".into(), format!("{:.3}", report.duration_secs)));
    rows
}

pub fn export_report_csv(report: &MatchReport, path: &str) -> Result<()> {
    let mut w = create_writer(path)?;
    w.write_record(["Key", "Value"])?;
    for (k, v) in report_rows(report) {
        w.write_record([k.as_str(), v.as_str()])?;
    }
    w.flush()
        .map_err(|e| ExportError::Csv(format!("{path}: {e}")))?;
    Ok(())
}

pub fn export_harvest_csv(rows: &[HarvestRow], path: &str) -> Result<()> {
    let mut w = create_writer(path)?;
    w.write_record(HARVEST_COLUMNS)?;
    for r in rows {
        w.write_record(r.values())?;
    }
    w.flush()
        .map_err(|e| ExportError::Csv(format!("{path}: {e}")))?;
    Ok(())
}
