use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use rating_matcher::cli::{Cli, Command, HarvestArgs, MatchArgs, TemplateArgs};
use rating_matcher::error::ConfigError;
use rating_matcher::export::csv_export::{
    export_harvest_csv, export_report_csv, export_worksheet_csv,
};
use rating_matcher::export::xlsx_export::{export_harvest_xlsx, export_worksheet_xlsx};
use rating_matcher::export::{
    OutputFormat, export_report_json, read_table, summary_path, with_extension,
};
use rating_matcher::harvest::RatingHarvest;
use rating_matcher::logging::init_logging;
use rating_matcher::matching::ProgressUpdate;
use rating_matcher::orchestrator::match_worksheet;
use rating_matcher::util::envfile::{load_dotenv_if_present, write_env_template};
use rating_matcher::worksheet::RatingWorksheet;

fn log_progress(u: ProgressUpdate) {
    info!(
        "[{}] {}/{} ({:.1}%) | mem used {} MB, avail {} MB",
        u.stage, u.processed, u.total, u.percent, u.mem_used_mb, u.mem_avail_mb
    );
}

fn run_match(args: &MatchArgs) -> Result<()> {
    let cfg = args.to_app_config()?;
    let mut worksheet = RatingWorksheet::read(&cfg.input.worksheets)?;
    let info = worksheet.worksheet_info();
    info!(
        "Worksheet: {} rows, {} columns ({} not required: {:?})",
        info.number_of_rows,
        info.number_of_columns,
        info.columns_not_required.len(),
        info.columns_not_required
    );
    worksheet.keep_columns(cfg.export.keep_columns.clone());

    let (_, reference_rows) = read_table(&cfg.input.reference)
        .with_context(|| format!("loading reference {}", cfg.input.reference))?;
    info!("Reference: {} rows from {}", reference_rows.len(), cfg.input.reference);

    let report = match_worksheet(&mut worksheet, reference_rows, &cfg.matching, log_progress)?;

    let out = cfg.export.out_path.clone().unwrap_or_default();
    let format = cfg
        .export
        .format
        .as_deref()
        .and_then(OutputFormat::parse)
        .unwrap_or(OutputFormat::Csv);
    if format.wants_csv() {
        let csv_path = with_extension(&out, "csv");
        export_worksheet_csv(&worksheet, &csv_path)?;
        let sum_path = summary_path(&csv_path);
        export_report_csv(&report, &sum_path)?;
        info!("Wrote {} and {}", csv_path, sum_path);
    }
    if format.wants_xlsx() {
        let xlsx_path = with_extension(&out, "xlsx");
        export_worksheet_xlsx(&worksheet, &report, &xlsx_path)?;
        info!("Wrote {}", xlsx_path);
    }
    if let Some(ref json_path) = cfg.export.report_json {
        export_report_json(&report, json_path)?;
        info!("Wrote {}", json_path);
    }

    for (k, v) in report.entries() {
        info!("{:<24} {}", k, v);
    }
    if report.duplicates > 0 || report.review > 0 {
        warn!(
            "{} rows need review and {} rows share a candidate_id",
            report.review, report.duplicates
        );
    }
    Ok(())
}

fn run_harvest(args: &HarvestArgs) -> Result<()> {
    let cfg = args.to_harvest_config()?;
    let records = if cfg.worksheets.is_empty() {
        Vec::new()
    } else {
        RatingWorksheet::read(&cfg.worksheets)?.into_records()
    };
    let rows = RatingHarvest::from_config(&cfg).generate(&records, cfg.number_of_rows);
    let format = cfg
        .format
        .as_deref()
        .and_then(OutputFormat::parse)
        .unwrap_or(OutputFormat::Csv);
    if format.wants_csv() {
        let csv_path = with_extension(&cfg.out_path, "csv");
        export_harvest_csv(&rows, &csv_path)?;
        info!("Wrote {} harvest rows to {}", rows.len(), csv_path);
    }
    if format.wants_xlsx() {
        let xlsx_path = with_extension(&cfg.out_path, "xlsx");
        export_harvest_xlsx(&rows, &xlsx_path)?;
        info!("Wrote {} harvest rows to {}", rows.len(), xlsx_path);
    }
    Ok(())
}

fn run_template(args: &TemplateArgs) -> Result<()> {
    let mut worksheet = match args.worksheet {
        Some(ref path) => {
            let (columns, records) = read_table(path)?;
            RatingWorksheet::new(columns, records)
        }
        None => RatingWorksheet::default(),
    };
    worksheet.generate(args.rows);
    export_worksheet_csv(&worksheet, &args.out)?;
    info!("Wrote template with {} rows to {}", worksheet.len(), args.out);
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match cli.command {
        Command::Match(ref args) => run_match(args),
        Command::Harvest(ref args) => run_harvest(args),
        Command::Template(ref args) => run_template(args),
        Command::EnvTemplate { ref path } => {
            write_env_template(path)?;
            info!("Wrote {}", path);
            Ok(())
        }
    }
}

fn main() {
    if let Err(e) = load_dotenv_if_present() {
        eprintln!("Warning: failed to load .env: {e:#}");
    }
    init_logging();

    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            if e.downcast_ref::<ConfigError>().is_some() {
                2
            } else {
                1
            }
        }
    };
    std::process::exit(code);
}
