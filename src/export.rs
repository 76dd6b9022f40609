//! Writes a finished dataset as CSV or as a JSON array of objects.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use serde_json::{Map, Value as JsonValue};

use crate::{dataset::TabularDataset, io_utils};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.json` selects JSON; every other path (and stdout) gets CSV.
    pub fn for_path(path: Option<&Path>) -> Self {
        match path.and_then(|p| p.extension()).and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

pub fn write_dataset<W: Write>(dataset: &TabularDataset, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(dataset, writer),
        ExportFormat::Json => write_json(dataset, writer),
    }
}

pub fn write_csv<W: Write>(dataset: &TabularDataset, writer: W) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
    writer
        .write_record(dataset.headers())
        .context("Writing output headers")?;
    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let fields = row
            .iter()
            .map(|cell| cell.as_ref().map(|v| v.as_display()).unwrap_or_default());
        writer
            .write_record(fields)
            .with_context(|| format!("Writing row {}", row_idx + 1))?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

pub fn write_json<W: Write>(dataset: &TabularDataset, mut writer: W) -> Result<()> {
    let headers = dataset.headers();
    let records = dataset
        .rows()
        .iter()
        .map(|row| {
            let object = headers
                .iter()
                .zip(row)
                .map(|(name, cell)| {
                    let value = cell.as_ref().map(|v| v.to_json()).unwrap_or(JsonValue::Null);
                    (name.clone(), value)
                })
                .collect::<Map<_, _>>();
            JsonValue::Object(object)
        })
        .collect::<Vec<_>>();
    serde_json::to_writer_pretty(&mut writer, &records).context("Serializing JSON output")?;
    writeln!(writer).context("Writing JSON output")?;
    writer.flush().context("Flushing JSON output")?;
    Ok(())
}
