use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    data::{Cell, ValueKey, cell_key},
    error::SchemaError,
    schema::{Column, classify_values},
};

/// Uniquely named, typed columns plus rows holding one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TabularDataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl TabularDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Result<Self, SchemaError> {
        ensure_unique(columns.iter().map(|c| c.name.as_str()))?;
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Ok(Self { columns, rows })
    }

    pub fn from_typed_rows(names: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, SchemaError> {
        ensure_unique(names.iter().map(String::as_str))?;
        Ok(Self::classified(names, rows))
    }

    // Caller guarantees unique names.
    pub(crate) fn classified(names: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column::new(name, classify_values(rows.iter().map(|row| &row[idx]))))
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Keeps only `columns`, in the order given.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self, SchemaError> {
        let indices = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column_index(name)
                    .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let selected = indices.iter().map(|idx| self.columns[*idx].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|idx| row[*idx].clone()).collect())
            .collect();
        Self::new(selected, rows)
    }

    /// True when two or more rows share a value in `key`; repeated nulls
    /// count. A dataset without the column has no duplicates.
    pub fn has_duplicate_keys(&self, key: &str) -> bool {
        let Some(idx) = self.column_index(key) else {
            return false;
        };
        let mut seen: HashSet<ValueKey> = HashSet::new();
        self.column_values(idx).any(|cell| !seen.insert(cell_key(cell)))
    }
}

fn ensure_unique<'a, I>(names: I) -> Result<(), SchemaError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Loaded datasets keyed by source identifier, in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct SourceCollection {
    entries: Vec<(String, TabularDataset)>,
    positions: HashMap<String, usize>,
}

impl SourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-inserting an existing id replaces its dataset in place and returns
    /// the old one.
    pub fn insert(
        &mut self,
        source: impl Into<String>,
        dataset: TabularDataset,
    ) -> Option<TabularDataset> {
        let source = source.into();
        if let Some(&pos) = self.positions.get(&source) {
            Some(std::mem::replace(&mut self.entries[pos].1, dataset))
        } else {
            self.positions.insert(source.clone(), self.entries.len());
            self.entries.push((source, dataset));
            None
        }
    }

    pub fn get(&self, source: &str) -> Option<&TabularDataset> {
        self.positions.get(source).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TabularDataset)> {
        self.entries.iter().map(|(name, ds)| (name.as_str(), ds))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn datasets(&self) -> Vec<TabularDataset> {
        self.entries.iter().map(|(_, ds)| ds.clone()).collect()
    }
}
