pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod export;
pub mod ingest;
pub mod io_utils;
pub mod merge;
pub mod pipeline;
pub mod pivot;
pub mod schema;
pub mod table;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::UnifyConfig,
    ingest::LoadOptions,
    pipeline::{LoadPolicy, LoadReport},
    table::Align,
};

pub use crate::{
    dataset::{SourceCollection, TabularDataset},
    error::{LoadError, MergeError, SchemaError},
    merge::merge_datasets,
    pivot::{PivotCandidate, score_columns},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_unify", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Score(args) => handle_score(&args),
        Commands::Merge(args) => handle_merge(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

/// Loads the config file (if any) and applies command line overrides.
fn resolve_config(args: &SourceArgs) -> Result<UnifyConfig> {
    let mut config = match &args.config {
        Some(path) => {
            UnifyConfig::load(path).with_context(|| format!("Loading config from {path:?}"))?
        }
        None => UnifyConfig::default(),
    };
    if let Some(delimiter) = args.delimiter {
        config.ingest.delimiter = delimiter;
    }
    if let Some(encoding) = &args.input_encoding {
        config.ingest.encoding = Some(encoding.clone());
    }
    if let Some(path) = &args.record_path {
        config.ingest.record_path = Some(path.clone());
    }
    Ok(config)
}

fn load_options(config: &UnifyConfig) -> Result<LoadOptions> {
    let encoding = io_utils::resolve_encoding(config.ingest.encoding.as_deref())?;
    Ok(LoadOptions::from_config(&config.ingest, encoding))
}

/// Reads every input up front. Unreadable files abort the batch unless
/// `skip_invalid` is set, in which case they are reported and dropped.
fn read_inputs(paths: &[PathBuf], skip_invalid: bool) -> Result<Vec<(String, Vec<u8>)>> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = io_utils::source_name(path);
        match io_utils::read_source(path) {
            Ok(bytes) => inputs.push((filename, bytes)),
            Err(source) if skip_invalid => {
                warn!("Skipping {}", LoadError::Io { filename, source });
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Reading input {path:?}"));
            }
        }
    }
    Ok(inputs)
}

fn load_batch(paths: &[PathBuf], config: &UnifyConfig, skip_invalid: bool) -> Result<LoadReport> {
    let options = load_options(config)?;
    let inputs = read_inputs(paths, skip_invalid)?;
    let policy = if skip_invalid {
        LoadPolicy::Skip
    } else {
        LoadPolicy::Abort
    };
    let report = pipeline::load_sources(&inputs, &options, policy)?;
    if report.sources.is_empty() {
        return Err(anyhow!("No input could be loaded"));
    }
    Ok(report)
}

fn handle_score(args: &cli::ScoreArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    let report = load_batch(&args.inputs, &config, args.skip_invalid)?;
    let analysis = pipeline::analysis_table(&report.sources);
    let candidates = pivot::score_columns_with(&analysis, &config.scoring)
        .context("Scoring key candidates")?;

    let shown = if args.top > 0 {
        &candidates[..args.top.min(candidates.len())]
    } else {
        &candidates[..]
    };
    let headers = ["rank", "column", "score", "evidence"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    let rows = shown
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            vec![
                (idx + 1).to_string(),
                candidate.name.clone(),
                format!("{:.2}", candidate.score),
                candidate.evidence.clone(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(
        &headers,
        &rows,
        &[Align::Right, Align::Left, Align::Right, Align::Left],
    );
    info!(
        "Scored {} column(s) across {} source(s)",
        candidates.len(),
        report.sources.len()
    );
    Ok(())
}

fn handle_merge(args: &cli::MergeArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    let report = load_batch(&args.inputs, &config, args.skip_invalid)?;

    let key = match &args.key {
        Some(key) => key.clone(),
        None => {
            let analysis = pipeline::analysis_table(&report.sources);
            let candidates = pivot::score_columns_with(&analysis, &config.scoring)
                .context("Scoring key candidates")?;
            let top = pivot::top_candidate(&candidates)
                .ok_or_else(|| anyhow!("Inputs have no columns to join on"))?;
            info!(
                "Using top-ranked key '{}' (score {:.2}; {})",
                top.name, top.score, top.evidence
            );
            top.name.clone()
        }
    };

    for advisory in pipeline::duplicate_key_advisories(&report.sources, &key) {
        if advisory.has_duplicates {
            warn!(
                "Duplicate values found for '{}' in {}; matching rows will fan out",
                key, advisory.source
            );
        }
    }

    let datasets = report.sources.datasets();
    let merged = merge::merge_datasets(&datasets, &key)
        .with_context(|| format!("Merging {} source(s) on '{key}'", datasets.len()))?;

    let curated = if args.columns.is_empty() {
        merged
    } else {
        let columns = args
            .columns
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>();
        debug!("Projecting output to {:?}", columns);
        merged
            .project(&columns)
            .context("Selecting output columns")?
    };

    let format = export::ExportFormat::for_path(args.output.as_deref());
    let writer = io_utils::open_output(args.output.as_deref())?;
    export::write_dataset(&curated, format, writer)?;
    info!(
        "Wrote {} row(s) x {} column(s)",
        curated.row_count(),
        curated.column_count()
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let config = resolve_config(&args.source)?;
    let options = load_options(&config)?;
    let bytes = io_utils::read_source(&args.input)
        .with_context(|| format!("Reading input {:?}", args.input))?;
    let name = io_utils::source_name(&args.input);
    let dataset = ingest::load(&bytes, &name, &options)?;
    print!("{}", table::render_dataset(&dataset, args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        dataset.row_count().min(args.rows),
        dataset.row_count(),
        args.input
    );
    Ok(())
}
