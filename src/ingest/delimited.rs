use std::io::Cursor;

use crate::{
    data::{Cell, parse_typed_value},
    dataset::TabularDataset,
    error::LoadError,
    io_utils,
    schema::{Column, TypeCandidate},
};

use super::LoadOptions;

/// Parses a delimited table whose first row names the columns.
///
/// Types are decided per column over all non-missing tokens before any value
/// is converted, so a single stray word turns the whole column into text.
pub fn load(bytes: &[u8], filename: &str, options: &LoadOptions) -> Result<TabularDataset, LoadError> {
    let text = io_utils::decode_bytes(bytes, options.encoding)
        .map_err(|reason| LoadError::parse(filename, reason))?;
    if text.trim().is_empty() {
        return Err(LoadError::parse(filename, "no columns to parse"));
    }

    let mut reader = io_utils::open_csv_reader(Cursor::new(text.as_bytes()), options.delimiter);
    let headers = reader
        .headers()
        .map_err(|err| LoadError::parse(filename, format!("reading header row: {err}")))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|err| LoadError::parse(filename, format!("row {}: {err}", row_idx + 2)))?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    text_rows_to_dataset(headers, raw_rows).map_err(|source| LoadError::schema(filename, source))
}

/// Classifies text columns and converts every token to its typed value.
pub(crate) fn text_rows_to_dataset(
    headers: Vec<String>,
    raw_rows: Vec<Vec<String>>,
) -> Result<TabularDataset, crate::error::SchemaError> {
    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    for row in &raw_rows {
        for (candidate, token) in candidates.iter_mut().zip(row) {
            candidate.update(token);
        }
    }

    let columns = headers
        .into_iter()
        .zip(&candidates)
        .map(|(name, candidate)| Column::new(name, candidate.decide()))
        .collect::<Vec<_>>();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, token)| parse_typed_value(&token, &column.datatype))
                .collect::<Vec<Cell>>()
        })
        .collect();

    TabularDataset::new(columns, rows)
}
