//! Join-key ranking.
//!
//! Each column scores `w_u·U + w_n·N + w_t·T` where `U` is the ratio of
//! distinct to non-null values, `N` flags a conventional key name and `T`
//! flags an integer or text column. With the default weights (0.5/0.3/0.2)
//! the score is in `[0, 1]`.

use std::{collections::HashSet, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::{
    config::ScoringConfig,
    data::ValueKey,
    dataset::TabularDataset,
    error::ConfigError,
    schema::Column,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotCandidate {
    pub name: String,
    pub score: f64,
    pub evidence: String,
}

/// Per-column inputs to the score, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Signals {
    uniqueness: f64,
    name_match: bool,
    key_like_type: bool,
}

impl Signals {
    fn measure(dataset: &TabularDataset, index: usize, column: &Column, names: Option<&Regex>) -> Self {
        let mut count = 0usize;
        let mut distinct: HashSet<ValueKey> = HashSet::new();
        for value in dataset.column_values(index).flatten() {
            count += 1;
            distinct.insert(value.key());
        }
        let uniqueness = if count > 0 {
            distinct.len() as f64 / count as f64
        } else {
            0.0
        };
        Self {
            uniqueness,
            name_match: names.is_some_and(|pattern| pattern.is_match(&column.name)),
            key_like_type: column.datatype.is_key_like(),
        }
    }

    fn score(&self, config: &ScoringConfig) -> f64 {
        let name = if self.name_match { 1.0 } else { 0.0 };
        let kind = if self.key_like_type { 1.0 } else { 0.0 };
        let total = config.uniqueness_weight * self.uniqueness
            + config.name_weight * name
            + config.type_weight * kind;
        total.clamp(0.0, 1.0)
    }

    fn evidence(&self) -> String {
        format!(
            "Uniq: {:.2}, Name: {}, Type: {}",
            self.uniqueness,
            if self.name_match { "Match" } else { "No Match" },
            if self.key_like_type { "Str/Int" } else { "Other" }
        )
    }
}

static DEFAULT_KEY_NAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:id|uuid|pk|key|task_id|_id)$").unwrap());

/// Scores every column of `dataset` with the default weights and key names.
pub fn score_columns(dataset: &TabularDataset) -> Vec<PivotCandidate> {
    rank(dataset, &ScoringConfig::default(), Some(&*DEFAULT_KEY_NAMES))
}

/// Scores every column, best first; equal scores keep column order.
pub fn score_columns_with(
    dataset: &TabularDataset,
    config: &ScoringConfig,
) -> Result<Vec<PivotCandidate>, ConfigError> {
    config.validate()?;
    let names = config.key_name_pattern()?;
    Ok(rank(dataset, config, names.as_ref()))
}

fn rank(dataset: &TabularDataset, config: &ScoringConfig, names: Option<&Regex>) -> Vec<PivotCandidate> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let signals = Signals::measure(dataset, index, column, names);
            PivotCandidate {
                name: column.name.clone(),
                score: signals.score(config),
                evidence: signals.evidence(),
            }
        })
        .sorted_by(|a, b| b.score.total_cmp(&a.score))
        .collect()
}

/// The best-ranked candidate, if the dataset has any columns.
pub fn top_candidate(candidates: &[PivotCandidate]) -> Option<&PivotCandidate> {
    candidates.first()
}
