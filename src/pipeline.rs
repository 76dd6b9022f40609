//! Batch-level operations that sit between the loaders and the caller:
//! loading a list of sources under a skip-or-abort policy, building the
//! analysis table the scorer reads, and per-source duplicate-key advisories.

use std::collections::HashMap;

use log::{info, warn};

use crate::{
    data::Cell,
    dataset::{SourceCollection, TabularDataset},
    error::LoadError,
    ingest::{self, LoadOptions},
};

/// What to do when one source fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Stop at the first failing source.
    #[default]
    Abort,
    /// Log the failure, remember it, and keep loading the rest.
    Skip,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub sources: SourceCollection,
    pub failures: Vec<LoadError>,
}

/// Loads `(filename, bytes)` pairs in the order given.
pub fn load_sources(
    inputs: &[(String, Vec<u8>)],
    options: &LoadOptions,
    policy: LoadPolicy,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();
    for (filename, bytes) in inputs {
        match ingest::load(bytes, filename, options) {
            Ok(dataset) => {
                info!(
                    "Loaded '{}' ({} row(s), {} column(s))",
                    filename,
                    dataset.row_count(),
                    dataset.column_count()
                );
                if report.sources.insert(filename.clone(), dataset).is_some() {
                    warn!("'{filename}' was loaded twice; keeping the later file");
                }
            }
            Err(err) if policy == LoadPolicy::Skip => {
                warn!("Skipping {err}");
                report.failures.push(err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}

/// Stacks every source's rows over the union of their column names (in order
/// of first appearance). Cells a source does not have are null; column types
/// are classified afresh over the stacked values.
pub fn analysis_table(sources: &SourceCollection) -> TabularDataset {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (_, dataset) in sources.iter() {
        for column in dataset.columns() {
            if !positions.contains_key(&column.name) {
                positions.insert(column.name.clone(), names.len());
                names.push(column.name.clone());
            }
        }
    }

    let width = names.len();
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (_, dataset) in sources.iter() {
        let mapping = dataset
            .columns()
            .iter()
            .map(|column| positions[&column.name])
            .collect::<Vec<_>>();
        for row in dataset.rows() {
            let mut stacked: Vec<Cell> = vec![None; width];
            for (cell, &target) in row.iter().zip(&mapping) {
                stacked[target] = cell.clone();
            }
            rows.push(stacked);
        }
    }

    TabularDataset::classified(names, rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyAdvisory {
    pub source: String,
    pub has_duplicates: bool,
}

/// Reports, for each source holding `key`, whether any key value repeats.
/// Advisories are informational; they never block a merge.
pub fn duplicate_key_advisories(sources: &SourceCollection, key: &str) -> Vec<DuplicateKeyAdvisory> {
    sources
        .iter()
        .filter(|(_, dataset)| dataset.has_column(key))
        .map(|(source, dataset)| DuplicateKeyAdvisory {
            source: source.to_string(),
            has_duplicates: dataset.has_duplicate_keys(key),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, schema::ColumnType};

    fn inputs(items: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        items
            .iter()
            .map(|(name, body)| (name.to_string(), body.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn abort_policy_returns_first_failure() {
        let err = load_sources(
            &inputs(&[("a.csv", "id\n1\n"), ("b.json", "{oops"), ("c.txt", "")]),
            &LoadOptions::default(),
            LoadPolicy::Abort,
        )
        .unwrap_err();
        assert_eq!(err.filename(), "b.json");
    }

    #[test]
    fn skip_policy_keeps_good_sources_in_order() {
        let report = load_sources(
            &inputs(&[
                ("b.csv", "id\n1\n"),
                ("bad.json", "{oops"),
                ("a.json", r#"[{"id": 2}]"#),
                ("notes.txt", "hello"),
            ]),
            &LoadOptions::default(),
            LoadPolicy::Skip,
        )
        .expect("skip never fails");
        assert_eq!(
            report.sources.sources().collect::<Vec<_>>(),
            vec!["b.csv", "a.json"]
        );
        let failed = report
            .failures
            .iter()
            .map(|f| f.filename())
            .collect::<Vec<_>>();
        assert_eq!(failed, vec!["bad.json", "notes.txt"]);
    }

    #[test]
    fn analysis_table_unions_columns_and_stacks_rows() {
        let report = load_sources(
            &inputs(&[
                ("a.csv", "id,val\n1,a\n2,b\n"),
                ("b.csv", "score,id\n20,2\n30,3\n"),
            ]),
            &LoadOptions::default(),
            LoadPolicy::Abort,
        )
        .expect("load");
        let table = analysis_table(&report.sources);
        assert_eq!(table.headers(), vec!["id", "val", "score"]);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.cell(2, "val"), Some(&None));
        assert_eq!(table.cell(3, "score"), Some(&Some(Value::Integer(30))));
        assert_eq!(table.columns()[0].datatype, ColumnType::Integer);
    }

    #[test]
    fn advisories_cover_only_sources_with_the_key() {
        let report = load_sources(
            &inputs(&[
                ("a.csv", "id\n1\n1\n"),
                ("b.csv", "id\n1\n2\n"),
                ("c.csv", "other\n1\n"),
            ]),
            &LoadOptions::default(),
            LoadPolicy::Abort,
        )
        .expect("load");
        let advisories = duplicate_key_advisories(&report.sources, "id");
        assert_eq!(
            advisories,
            vec![
                DuplicateKeyAdvisory {
                    source: "a.csv".into(),
                    has_duplicates: true
                },
                DuplicateKeyAdvisory {
                    source: "b.csv".into(),
                    has_duplicates: false
                },
            ]
        );
    }
}
