use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Unify CSV, spreadsheet and JSON sources on an inferred join key",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank every column across the inputs by how likely it is to be the join key
    Score(ScoreArgs),
    /// Outer-join the inputs on a key column and write the unified table
    Merge(MergeArgs),
    /// Load a single source and show its first rows with inferred column types
    Preview(PreviewArgs),
}

/// Options shared by every command that loads sources.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// YAML config with scoring weights, key names and ingest defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Delimiter for .csv inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of .csv inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Key holding the record list in JSON inputs (detected when omitted)
    #[arg(long = "record-path")]
    pub record_path: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// Input files in ingestion order (.csv, .xlsx, .xls, .json)
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Show only the N best candidates (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
    /// Skip inputs that fail to load instead of aborting
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Input files in ingestion order (.csv, .xlsx, .xls, .json)
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Key column to join on (defaults to the top-ranked candidate)
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,
    /// Restrict output to this comma-separated list of columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Output file; .json writes an array of objects, anything else CSV (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Skip inputs that fail to load instead of aborting
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
