//! Format-normalizing loaders.
//!
//! Each loader turns a fully buffered byte stream plus a filename hint into a
//! [`TabularDataset`] or a [`LoadError`]; no loader ever returns a partially
//! populated dataset. The concrete loader is picked by [`SourceFormat`],
//! derived from the file extension.

pub mod delimited;
pub mod json;
pub mod record_path;
pub mod spreadsheet;

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{config::IngestConfig, dataset::TabularDataset, error::LoadError};

pub use record_path::{DEFAULT_RECORD_PATH_CANDIDATES, detect_record_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
    Json,
}

impl SourceFormat {
    /// Picks the loader from the extension (case-insensitive): `.csv`,
    /// `.xlsx`/`.xls`, `.json`.
    pub fn from_filename(filename: &str) -> Result<Self, LoadError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Delimited),
            Some("xlsx") | Some("xls") => Ok(SourceFormat::Spreadsheet),
            Some("json") => Ok(SourceFormat::Json),
            _ => Err(LoadError::UnsupportedFormat {
                filename: filename.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Delimited => "delimited",
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::Json => "json",
        }
    }

    pub fn load(
        &self,
        bytes: &[u8],
        filename: &str,
        options: &LoadOptions,
    ) -> Result<TabularDataset, LoadError> {
        let dataset = match self {
            SourceFormat::Delimited => delimited::load(bytes, filename, options)?,
            SourceFormat::Spreadsheet => spreadsheet::load(bytes, filename)?,
            SourceFormat::Json => json::load(bytes, filename, options)?,
        };
        debug!(
            "Loaded {filename} as {}: {} row(s) x {} column(s)",
            self.as_str(),
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }
}

/// Loader knobs that are not implied by the format itself.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub record_path_candidates: Vec<String>,
    pub record_path: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: UTF_8,
            record_path_candidates: DEFAULT_RECORD_PATH_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            record_path: None,
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &IngestConfig, encoding: &'static Encoding) -> Self {
        Self {
            delimiter: config.delimiter,
            encoding,
            record_path_candidates: config.record_path_candidates.clone(),
            record_path: config.record_path.clone(),
        }
    }
}

/// Loads one buffered source, choosing the loader from `filename`.
pub fn load(
    bytes: &[u8],
    filename: &str,
    options: &LoadOptions,
) -> Result<TabularDataset, LoadError> {
    SourceFormat::from_filename(filename)?.load(bytes, filename, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SourceFormat::from_filename("a.CSV").unwrap(),
            SourceFormat::Delimited
        );
        assert_eq!(
            SourceFormat::from_filename("dir/book.xls").unwrap(),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_filename("tasks.json").unwrap(),
            SourceFormat::Json
        );
        let err = SourceFormat::from_filename("notes.txt").unwrap_err();
        assert_eq!(err.filename(), "notes.txt");
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }
}
