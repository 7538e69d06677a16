use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Sheets, open_workbook_auto};

use crate::models::Record;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // integers without decimals, so ids typed as numbers keep their form
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => format!("{}", n),
        Data::Int(n) => format!("{}", n),
        other => other.to_string(),
    }
}

/// Read the first sheet of a workbook (xlsx, xls, xlsb, ods) as a headered
/// table. Rows with no values at all are skipped.
pub fn read_records_xlsx(path: &str) -> Result<(Vec<String>, Vec<Record>)> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).with_context(|| format!("opening workbook {path}"))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        bail!("{path} contains no sheets");
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}' of {path}"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(h) => h.iter().map(cell_text).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };
    let mut records = Vec::new();
    for row in rows {
        let values: Vec<String> = row.iter().map(cell_text).collect();
        if values.iter().all(String::is_empty) {
            continue;
        }
        records.push(Record::from_pairs(headers.iter().enumerate().map(|(c, h)| {
            (h.as_str(), values.get(c).map(String::as_str).unwrap_or(""))
        })));
    }
    log::debug!(
        "Read {} rows x {} columns from {} (sheet '{}')",
        records.len(),
        headers.len(),
        path,
        sheet_name
    );
    Ok((headers, records))
}
