//! Multi-way outer join on a single key column. Incoming non-key columns
//! whose name is already taken get the suffix `_file{n}` (1-based position).

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::{
    data::{Cell, ValueKey, cell_key},
    dataset::TabularDataset,
    error::MergeError,
};

/// Folds `datasets` left to right with full outer joins on `key`. Keys match
/// by [`ValueKey`], so nulls match nulls; duplicate keys fan out.
pub fn merge_datasets(datasets: &[TabularDataset], key: &str) -> Result<TabularDataset, MergeError> {
    match datasets {
        [] => return Ok(TabularDataset::empty()),
        [single] => return Ok(single.clone()),
        _ => {}
    }

    for (idx, dataset) in datasets.iter().enumerate() {
        if !dataset.has_column(key) {
            return Err(MergeError::MissingKey {
                key: key.to_string(),
                position: idx + 1,
            });
        }
    }

    let plans = plan_columns(datasets, key)?;

    let first = &datasets[0];
    let mut accumulator = Accumulator {
        names: first.headers(),
        key_index: first.column_index(key).unwrap_or_default(),
        rows: first.rows().to_vec(),
    };
    for (incoming, plan) in datasets[1..].iter().zip(plans) {
        accumulator = accumulator.outer_join(incoming, plan);
    }

    info!(
        "Merged {} dataset(s) on '{}': {} row(s), {} column(s)",
        datasets.len(),
        key,
        accumulator.rows.len(),
        accumulator.names.len()
    );
    Ok(TabularDataset::classified(accumulator.names, accumulator.rows))
}

#[derive(Debug)]
struct JoinPlan {
    key_index: usize,
    /// Incoming column index and the name it takes in the output.
    carried: Vec<(usize, String)>,
}

// Names for every fold step are resolved before the first join.
fn plan_columns(datasets: &[TabularDataset], key: &str) -> Result<Vec<JoinPlan>, MergeError> {
    let mut taken: HashSet<String> = datasets[0].headers().into_iter().collect();
    let mut plans = Vec::with_capacity(datasets.len() - 1);

    for (idx, incoming) in datasets.iter().enumerate().skip(1) {
        let position = idx + 1;
        let suffix = format!("_file{position}");
        let mut carried = Vec::new();
        let mut added = Vec::new();
        for (col_idx, column) in incoming.columns().iter().enumerate() {
            if column.name == key {
                continue;
            }
            let name = if taken.contains(&column.name) {
                let renamed = format!("{}{suffix}", column.name);
                if taken.contains(&renamed) {
                    return Err(MergeError::ColumnCollision {
                        column: renamed,
                        position,
                    });
                }
                renamed
            } else {
                column.name.clone()
            };
            added.push(name.clone());
            carried.push((col_idx, name));
        }
        taken.extend(added);
        plans.push(JoinPlan {
            key_index: incoming.column_index(key).unwrap_or_default(),
            carried,
        });
    }
    Ok(plans)
}

struct Accumulator {
    names: Vec<String>,
    key_index: usize,
    rows: Vec<Vec<Cell>>,
}

impl Accumulator {
    fn outer_join(self, incoming: &TabularDataset, plan: JoinPlan) -> Self {
        let mut lookup: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        for (row_idx, row) in incoming.rows().iter().enumerate() {
            lookup
                .entry(cell_key(&row[plan.key_index]))
                .or_default()
                .push(row_idx);
        }

        let carried_cells = |row: &[Cell]| -> Vec<Cell> {
            plan.carried
                .iter()
                .map(|(idx, _)| row[*idx].clone())
                .collect()
        };

        let width = self.names.len();
        let mut matched = vec![false; incoming.row_count()];
        let mut rows = Vec::with_capacity(self.rows.len().max(incoming.row_count()));
        let mut matched_pairs = 0usize;

        for left in self.rows {
            let bucket = lookup.get(&cell_key(&left[self.key_index]));
            match bucket {
                Some(bucket) => {
                    for &right_idx in bucket {
                        matched[right_idx] = true;
                        matched_pairs += 1;
                        let mut combined = left.clone();
                        combined.extend(carried_cells(&incoming.rows()[right_idx]));
                        rows.push(combined);
                    }
                }
                None => {
                    let mut combined = left;
                    combined.extend(std::iter::repeat_n(None, plan.carried.len()));
                    rows.push(combined);
                }
            }
        }

        for (right_idx, right) in incoming.rows().iter().enumerate() {
            if matched[right_idx] {
                continue;
            }
            let mut combined: Vec<Cell> = vec![None; width];
            combined[self.key_index] = right[plan.key_index].clone();
            combined.extend(carried_cells(right));
            rows.push(combined);
        }

        debug!(
            "Outer join step: {} matched pair(s), {} row(s) after join",
            matched_pairs,
            rows.len()
        );

        let mut names = self.names;
        names.extend(plan.carried.into_iter().map(|(_, name)| name));
        Self {
            names,
            key_index: self.key_index,
            rows,
        }
    }
}
