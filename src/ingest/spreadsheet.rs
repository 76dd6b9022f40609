use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    data::{Cell, Value, is_missing_token, parse_typed_value},
    dataset::TabularDataset,
    error::{LoadError, SchemaError},
    schema::{Column, ColumnType, TypeCandidate},
};

/// A spreadsheet cell before column typing is decided.
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Empty,
    Text(String),
    Native(Value),
}

/// Reads the first sheet of an `.xlsx`/`.xls` workbook. The first row holds
/// the column names; blank header cells are named `column_{n}`.
pub fn load(bytes: &[u8], filename: &str) -> Result<TabularDataset, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| LoadError::parse(filename, err))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::schema(filename, SchemaError::EmptyWorkbook))?
        .map_err(|err| LoadError::parse(filename, format!("reading first sheet: {err}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(TabularDataset::empty());
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| match convert_cell(cell) {
            SheetCell::Empty => format!("column_{}", idx + 1),
            SheetCell::Text(text) => text,
            SheetCell::Native(value) => value.as_display(),
        })
        .collect::<Vec<_>>();

    let width = headers.len();
    let body = rows
        .map(|row| {
            let mut cells = row.iter().map(convert_cell).collect::<Vec<_>>();
            cells.resize(width, SheetCell::Empty);
            cells
        })
        .collect::<Vec<_>>();

    sheet_rows_to_dataset(headers, body).map_err(|source| LoadError::schema(filename, source))
}

fn convert_cell(cell: &Data) -> SheetCell {
    match cell {
        Data::Empty | Data::Error(_) => SheetCell::Empty,
        Data::Int(i) => SheetCell::Native(Value::Integer(*i)),
        Data::Float(f) => SheetCell::Native(Value::Float(*f)),
        Data::Bool(b) => SheetCell::Native(Value::Boolean(*b)),
        Data::String(s) if is_missing_token(s) => SheetCell::Empty,
        Data::String(s) => SheetCell::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(parsed) => SheetCell::Text(format_datetime(parsed)),
            None => SheetCell::Native(Value::Float(dt.as_f64())),
        },
        Data::DateTimeIso(s) => SheetCell::Text(normalize_iso_datetime(s)),
        Data::DurationIso(s) => SheetCell::Text(s.clone()),
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// ISO cells (from `.ods`/strict xlsx) are rendered like serial datetimes;
/// anything unparseable is kept verbatim.
fn normalize_iso_datetime(text: &str) -> String {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return format_datetime(parsed);
    }
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => text.to_string(),
    }
}

fn sheet_rows_to_dataset(
    headers: Vec<String>,
    body: Vec<Vec<SheetCell>>,
) -> Result<TabularDataset, SchemaError> {
    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    for row in &body {
        for (candidate, cell) in candidates.iter_mut().zip(row) {
            match cell {
                SheetCell::Empty => {}
                SheetCell::Text(text) => candidate.update(text),
                SheetCell::Native(value) => candidate.observe_typed(value),
            }
        }
    }

    let columns = headers
        .into_iter()
        .zip(&candidates)
        .map(|(name, candidate)| Column::new(name, candidate.decide()))
        .collect::<Vec<_>>();

    let rows = body
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, cell)| coerce(cell, column.datatype))
                .collect::<Vec<Cell>>()
        })
        .collect();

    TabularDataset::new(columns, rows)
}

/// Converts a cell into the representation its column type calls for.
fn coerce(cell: SheetCell, datatype: ColumnType) -> Cell {
    match cell {
        SheetCell::Empty => None,
        SheetCell::Text(text) => parse_typed_value(&text, &datatype),
        SheetCell::Native(value) => Some(match (datatype, value) {
            (ColumnType::Integer, Value::Float(f)) => Value::Integer(f as i64),
            (ColumnType::Float, Value::Integer(i)) => Value::Float(i as f64),
            (ColumnType::String, other) => Value::String(other.as_display()),
            (_, other) => other,
        }),
    }
}
