use crate::config::{AppConfig, ExportConfig, HarvestConfig, InputConfig, MatchingConfig};
use crate::error::ConfigError;
use crate::matching::SimilarityKind;
use crate::worksheet::KeepColumns;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Csv,
    Xlsx,
    Both,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum, Debug)]
pub enum SimilarityOpt {
    JaroWinkler,
    Levenshtein,
    TokenSort,
}

impl From<SimilarityOpt> for SimilarityKind {
    fn from(o: SimilarityOpt) -> Self {
        match o {
            SimilarityOpt::JaroWinkler => SimilarityKind::JaroWinkler,
            SimilarityOpt::Levenshtein => SimilarityKind::Levenshtein,
            SimilarityOpt::TokenSort => SimilarityKind::TokenSort,
        }
    }
}

/// `all`, `none`, or a comma-separated list of column names.
pub fn parse_keep_columns(s: &str) -> KeepColumns {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "all" => KeepColumns::All,
        "none" => KeepColumns::None,
        _ => KeepColumns::Selected(
            s.split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        ),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rating_matcher",
    version,
    about = "Resolve rating worksheet rows to reference candidate identifiers",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match worksheet rows against a reference export
    Match(MatchArgs),
    /// Build a rating harvest sheet
    Harvest(HarvestArgs),
    /// Write a blank worksheet template
    Template(TemplateArgs),
    /// Write a .env template with every supported variable
    EnvTemplate {
        #[arg(value_name = "PATH", default_value = ".env.template")]
        path: String,
    },
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Worksheet files (.csv or .xlsx); rows are concatenated in order
    #[arg(value_name = "WORKSHEET", required = true)]
    pub worksheets: Vec<String>,
    /// Reference export (.csv or .xlsx) carrying candidate_id (env: RATING_MATCHER_REFERENCE)
    #[arg(long, short = 'r', env = "RATING_MATCHER_REFERENCE")]
    pub reference: String,
    /// Output path (env: RATING_MATCHER_OUT)
    #[arg(long, short = 'o', env = "RATING_MATCHER_OUT")]
    pub out: String,
    /// Output format (env: RATING_MATCHER_FORMAT)
    #[arg(long, env = "RATING_MATCHER_FORMAT", default_value_t = FormatOpt::Csv)]
    pub format: FormatOpt,
    /// String similarity for fuzzy steps
    #[arg(long, value_enum, default_value = "jaro-winkler")]
    pub similarity: SimilarityOpt,
    /// Resolve rows in parallel (env: RATING_MATCHER_PARALLEL, accepts 1/0, true/false, yes/no)
    #[arg(long, env = "RATING_MATCHER_PARALLEL", value_parser = BoolishValueParser::new())]
    pub parallel: bool,
    /// Progress log interval in rows
    #[arg(long, value_name = "ROWS", default_value_t = 500)]
    pub progress_every: usize,
    /// Pass-through columns to keep: all, none, or a comma list
    #[arg(long, value_name = "COLUMNS", default_value = "all")]
    pub keep_columns: String,
    /// Also write the report as JSON
    #[arg(long, value_name = "PATH")]
    pub report_json: Option<String>,
}

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Matched worksheet files (.csv or .xlsx); omit for a blank sheet
    #[arg(value_name = "WORKSHEET")]
    pub worksheets: Vec<String>,
    #[arg(long, short = 'o', env = "RATING_MATCHER_OUT")]
    pub out: String,
    /// Output format (env: RATING_MATCHER_FORMAT)
    #[arg(long, env = "RATING_MATCHER_FORMAT", default_value_t = FormatOpt::Csv)]
    pub format: FormatOpt,
    /// Rating year `YYYY` or range `YYYY-YYYY` (1989 to 3000)
    #[arg(long)]
    pub span: String,
    #[arg(long, default_value = "")]
    pub sig_id: String,
    /// `t` to display the SIG rating, `f` for our rating
    #[arg(long, default_value = "t")]
    pub usesigrating: String,
    #[arg(long, default_value = "")]
    pub ratingsession: String,
    #[arg(long, default_value = "")]
    pub ratingformat_id: String,
    /// Row count for a blank sheet
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Existing worksheet to convert; omit for a blank template
    #[arg(value_name = "WORKSHEET")]
    pub worksheet: Option<String>,
    #[arg(long, short = 'o')]
    pub out: String,
    #[arg(long, default_value_t = 0)]
    pub rows: usize,
}

impl MatchArgs {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig {
            input: InputConfig {
                worksheets: self.worksheets.clone(),
                reference: self.reference.clone(),
            },
            matching: MatchingConfig {
                similarity: self.similarity.into(),
                parallel: self.parallel,
                progress_every: self.progress_every,
            },
            export: ExportConfig {
                out_path: Some(self.out.clone()),
                format: Some(self.format.as_str().into()),
                keep_columns: parse_keep_columns(&self.keep_columns),
                report_json: self.report_json.clone(),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl HarvestArgs {
    pub fn to_harvest_config(&self) -> Result<HarvestConfig, ConfigError> {
        let cfg = HarvestConfig {
            worksheets: self.worksheets.clone(),
            out_path: self.out.clone(),
            format: Some(self.format.as_str().into()),
            span: self.span.clone(),
            sig_id: self.sig_id.clone(),
            usesigrating: self.usesigrating.clone(),
            ratingsession: self.ratingsession.clone(),
            ratingformat_id: self.ratingformat_id.clone(),
            number_of_rows: self.rows,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
