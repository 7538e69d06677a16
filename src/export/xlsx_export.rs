use anyhow::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

use crate::error::ExportError;
use crate::export::csv_export::report_rows;
use crate::export::ensure_parent_dir;
use crate::harvest::{HARVEST_COLUMNS, HarvestRow};
use crate::orchestrator::summary::MatchReport;
use crate::worksheet::RatingWorksheet;

const MAX_DATA_ROWS: usize = 1_048_575;

fn header_format() -> Format {
    Format::new().set_bold().set_align(FormatAlign::Center)
}

fn row_format_even() -> Format {
    Format::new().set_background_color(Color::RGB(0xF2F2F2))
}

fn write_worksheet_sheet(sheet: &mut Worksheet, worksheet: &RatingWorksheet) -> Result<()> {
    let columns = worksheet.output_columns();
    let hfmt = header_format();
    for (c, h) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, h, &hfmt)?;
    }
    let even = row_format_even();
    for (i, rec) in worksheet.records().iter().enumerate() {
        let row = (i as u32) + 1;
        if i % 2 == 0 {
            sheet.set_row_format(row, &even)?;
        }
        for (c, v) in worksheet.row_values(rec, &columns).iter().enumerate() {
            sheet.write_string(row, c as u16, v)?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, report: &MatchReport) -> Result<()> {
    let hfmt = header_format();
    sheet.write_string_with_format(0, 0, "Key", &hfmt)?;
    sheet.write_string_with_format(0, 1, "Value", &hfmt)?;
    for (i, (k, v)) in report_rows(report).iter().enumerate() {
        let row = (i as u32) + 1;
        sheet.write_string(row, 0, k)?;
        match v.parse::<f64>() {
            Ok(n) => sheet.write_number(row, 1, n)?,
            Err(_) => sheet.write_string(row, 1, v)?,
        };
    }
    sheet.set_column_width(0, 28)?;
    Ok(())
}

/// Workbook with the enriched rows on `Worksheet` and the report on `Summary`.
pub fn export_worksheet_xlsx(
    worksheet: &RatingWorksheet,
    report: &MatchReport,
    out_path: &str,
) -> Result<()> {
    if worksheet.len() > MAX_DATA_ROWS {
        return Err(ExportError::Xlsx(format!(
            "{} rows exceed the sheet limit of {}",
            worksheet.len(),
            MAX_DATA_ROWS
        ))
        .into());
    }
    ensure_parent_dir(out_path)?;

    let mut workbook = Workbook::new();

    let sheet1 = workbook.add_worksheet();
    sheet1.set_name("Worksheet")?;
    write_worksheet_sheet(sheet1, worksheet)?;

    let sheet2 = workbook.add_worksheet();
    sheet2.set_name("Summary")?;
    write_summary_sheet(sheet2, report)?;

    workbook.save(out_path)?;
    Ok(())
}

/// Harvest sheet as a single-sheet workbook named `Harvest`.
pub fn export_harvest_xlsx(rows: &[HarvestRow], out_path: &str) -> Result<()> {
    if rows.len() > MAX_DATA_ROWS {
        return Err(ExportError::Xlsx(format!(
            "{} rows exceed the sheet limit of {}",
            rows.len(),
            MAX_DATA_ROWS
        ))
        .into());
    }
    ensure_parent_dir(out_path)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Harvest")?;

    let hfmt = header_format();
    for (c, h) in HARVEST_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *h, &hfmt)?;
    }
    let even = row_format_even();
    for (i, r) in rows.iter().enumerate() {
        let row = (i as u32) + 1;
        if i % 2 == 0 {
            sheet.set_row_format(row, &even)?;
        }
        for (c, v) in r.values().iter().enumerate() {
            sheet.write_string(row, c as u16, *v)?;
        }
    }

    workbook.save(out_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::read_table;
    use crate::models::{MatchStatus, Record};
    use crate::orchestrator::summary::SummaryBuilder;

    #[test]
    fn write_xlsx_basic() {
        let dir = tempfile::tempdir().unwrap();
        let rec = Record {
            lastname: "Smith".into(),
            firstname: "John".into(),
            candidate_id: "42".into(),
            match_status: Some(MatchStatus::LastFuzzyFirst),
            ..Default::default()
        };
        let ws = RatingWorksheet::from_records(vec![rec]);
        let report = SummaryBuilder::new(1).build().unwrap();
        let out = dir.path().join("matches.xlsx");
        let res = export_worksheet_xlsx(&ws, &report, out.to_str().unwrap());
        assert!(res.is_ok());
        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn worksheet_workbook_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = Record::from_pairs([("lastname", "Muñoz"), ("firstname", "Ana"), ("Notes", "n1")]);
        rec.candidate_id = "0042".into();
        rec.match_status = Some(MatchStatus::Review);
        let ws = RatingWorksheet::new(
            vec!["lastname".into(), "firstname".into(), "Notes".into()],
            vec![rec],
        );
        let report = SummaryBuilder::new(1).build().unwrap();
        let out = dir.path().join("out").join("matched.xlsx");
        let out = out.to_str().unwrap();
        export_worksheet_xlsx(&ws, &report, out).unwrap();

        let back = RatingWorksheet::read(&[out.to_string()]).unwrap();
        assert_eq!(back.len(), 1);
        let r = &back.records()[0];
        assert_eq!(r.lastname, "Muñoz");
        assert_eq!(r.candidate_id, "0042");
        assert_eq!(r.match_status, Some(MatchStatus::Review));
        assert_eq!(back.not_required_columns(), ["Notes"]);
    }

    #[test]
    fn harvest_workbook_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            HarvestRow {
                candidate_id: "42".into(),
                sig_rating: "A".into(),
                our_rating: "90".into(),
                span: "2021-2022".into(),
                sig_id: "1234".into(),
                usesigrating: "t".into(),
                ratingsession: "Primary".into(),
                ratingformat_id: "1".into(),
            },
            HarvestRow {
                candidate_id: "43".into(),
                span: "2021-2022".into(),
                ..Default::default()
            },
        ];
        let out = dir.path().join("harvest.xlsx");
        let out = out.to_str().unwrap();
        export_harvest_xlsx(&rows, out).unwrap();

        let (headers, back) = read_table(out).unwrap();
        assert_eq!(headers, HARVEST_COLUMNS);
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].candidate_id, "42");
        assert_eq!(back[0].sig_rating, "A");
        assert_eq!(back[0].extra_fields.get("span").map(String::as_str), Some("2021-2022"));
        assert_eq!(back[0].extra_fields.get("usesigrating").map(String::as_str), Some("t"));
        assert_eq!(back[1].candidate_id, "43");
    }
}
