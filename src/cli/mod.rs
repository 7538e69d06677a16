//! Command-line front end: clap definitions and conversion into config.

mod clap_parser;

pub use clap_parser::{
    Cli, Command, FormatOpt, HarvestArgs, MatchArgs, SimilarityOpt, TemplateArgs,
    parse_keep_columns,
};
