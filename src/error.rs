//! Typed errors surfaced by the ingestion, scoring and merge layers.
//!
//! Core functions return these values directly; the command handlers in
//! `lib.rs` wrap them with `anyhow` context the same way they wrap I/O.

use thiserror::Error;

/// A source file could not be turned into a dataset. Every variant names the
/// file so a batch caller can report and skip it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file type for '{filename}' (expected .csv, .xlsx, .xls or .json)")]
    UnsupportedFormat { filename: String },

    #[error("Reading '{filename}': {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{filename}': {reason}")]
    Parse { filename: String, reason: String },

    #[error("Inconsistent structure in '{filename}': {source}")]
    Schema {
        filename: String,
        #[source]
        source: SchemaError,
    },
}

impl LoadError {
    pub fn filename(&self) -> &str {
        match self {
            LoadError::UnsupportedFormat { filename }
            | LoadError::Io { filename, .. }
            | LoadError::Parse { filename, .. }
            | LoadError::Schema { filename, .. } => filename,
        }
    }

    pub(crate) fn parse(filename: &str, reason: impl ToString) -> Self {
        LoadError::Parse {
            filename: filename.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(filename: &str, source: SchemaError) -> Self {
        LoadError::Schema {
            filename: filename.to_string(),
            source,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("record key '{0}' does not hold a list")]
    RecordPathNotList(String),

    #[error("record key '{0}' is not present in the document")]
    RecordPathMissing(String),

    #[error("record {index} under '{path}' is not an object")]
    RecordNotObject { path: String, index: usize },

    #[error("metadata key '{0}' conflicts with a record field of the same name")]
    MetadataConflict(String),

    #[error("document root must be an object or a list, found {0}")]
    UnsupportedRoot(&'static str),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{0}' not found")]
    UnknownColumn(String),

    #[error("workbook does not contain any sheets")]
    EmptyWorkbook,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("Key column '{key}' missing in dataset #{position}")]
    MissingKey { key: String, position: usize },

    #[error("Column '{column}' from dataset #{position} collides with an existing column after suffixing")]
    ColumnCollision { column: String, position: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reading config file {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid key name pattern: {0}")]
    KeyPattern(#[from] regex::Error),
}
