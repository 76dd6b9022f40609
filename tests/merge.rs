use proptest::prelude::*;
use table_unify::{
    MergeError, TabularDataset,
    data::{Cell, Value},
    merge_datasets,
    schema::ColumnType,
};

fn int(i: i64) -> Cell {
    Some(Value::Integer(i))
}

fn text(s: &str) -> Cell {
    Some(Value::String(s.to_string()))
}

fn dataset(names: &[&str], rows: Vec<Vec<Cell>>) -> TabularDataset {
    TabularDataset::from_typed_rows(names.iter().map(|s| s.to_string()).collect(), rows)
        .expect("dataset")
}

#[test]
fn no_datasets_merge_to_empty() {
    let merged = merge_datasets(&[], "id").expect("merge");
    assert!(merged.is_empty());
}

#[test]
fn single_dataset_is_returned_unchanged() {
    let only = dataset(&["name"], vec![vec![text("a")]]);
    let merged = merge_datasets(std::slice::from_ref(&only), "missing").expect("merge");
    assert_eq!(merged, only);
}

#[test]
fn two_sources_outer_join_on_key() {
    let labels = dataset(
        &["id", "label"],
        vec![vec![int(1), text("cat")], vec![int(2), text("dog")]],
    );
    let scores = dataset(
        &["id", "score"],
        vec![vec![int(2), int(20)], vec![int(3), int(30)]],
    );
    let merged = merge_datasets(&[labels, scores], "id").expect("merge");
    assert_eq!(merged.headers(), vec!["id", "label", "score"]);
    assert_eq!(
        merged.rows(),
        &[
            vec![int(1), text("cat"), None],
            vec![int(2), text("dog"), int(20)],
            vec![int(3), None, int(30)],
        ]
    );
    assert_eq!(merged.columns()[2].datatype, ColumnType::Integer);
}

#[test]
fn repeated_names_get_positional_suffixes() {
    let a = dataset(&["id", "status"], vec![vec![int(1), text("new")]]);
    let b = dataset(&["id", "status"], vec![vec![int(1), text("open")]]);
    let c = dataset(&["status", "id"], vec![vec![text("closed"), int(1)]]);
    let merged = merge_datasets(&[a, b, c], "id").expect("merge");
    assert_eq!(
        merged.headers(),
        vec!["id", "status", "status_file2", "status_file3"]
    );
    assert_eq!(
        merged.rows(),
        &[vec![int(1), text("new"), text("open"), text("closed")]]
    );
}

#[test]
fn missing_key_names_the_dataset_position() {
    let a = dataset(&["id"], vec![vec![int(1)]]);
    let b = dataset(&["other"], vec![vec![int(1)]]);
    let err = merge_datasets(&[a, b], "id").unwrap_err();
    assert_eq!(
        err,
        MergeError::MissingKey {
            key: "id".into(),
            position: 2
        }
    );
    assert_eq!(err.to_string(), "Key column 'id' missing in dataset #2");
}

#[test]
fn mixed_key_types_widen_to_text() {
    let a = dataset(&["id", "x"], vec![vec![text("A-1"), int(1)]]);
    let b = dataset(&["id", "y"], vec![vec![int(7), int(2)]]);
    let merged = merge_datasets(&[a, b], "id").expect("merge");
    assert_eq!(merged.row_count(), 2);
    assert_eq!(merged.columns()[0].datatype, ColumnType::String);
}

#[test]
fn null_keys_join_like_any_other_value() {
    let a = dataset(&["id", "a"], vec![vec![None, text("x")]]);
    let b = dataset(&["id", "b"], vec![vec![None, text("y")]]);
    let merged = merge_datasets(&[a, b], "id").expect("merge");
    assert_eq!(merged.rows(), &[vec![None, text("x"), text("y")]]);
}

fn keyed_rows() -> impl Strategy<Value = Vec<Vec<Cell>>> {
    prop::collection::vec(
        (prop::option::of(0i64..6), 0i64..100).prop_map(|(k, v)| vec![k.map(Value::Integer), int(v)]),
        0..10,
    )
}

proptest! {
    #[test]
    fn outer_join_row_count_is_bounded(left in keyed_rows(), right in keyed_rows()) {
        let left_len = left.len();
        let right_len = right.len();
        let a = dataset(&["id", "a"], left);
        let b = dataset(&["id", "b"], right);
        let merged = merge_datasets(&[a, b], "id").expect("merge");
        prop_assert_eq!(merged.headers(), vec!["id", "a", "b"]);
        prop_assert!(merged.row_count() >= left_len.max(right_len));
        prop_assert!(merged.row_count() <= left_len * right_len.max(1) + right_len);
        for row in merged.rows() {
            prop_assert_eq!(row.len(), 3);
        }
    }
}
