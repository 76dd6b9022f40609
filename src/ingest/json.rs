//! Nested JSON documents flattened into rows.
//!
//! An object root is searched for its record list (see
//! [`detect_record_path`]); scalar siblings of that list are copied onto
//! every row as metadata columns. A list root is a plain list of records,
//! and an object without any list becomes a single row.

use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{Cell, Value},
    dataset::TabularDataset,
    error::{LoadError, SchemaError},
};

use super::{LoadOptions, detect_record_path};

const ROOT_PATH: &str = "$";

pub fn load(bytes: &[u8], filename: &str, options: &LoadOptions) -> Result<TabularDataset, LoadError> {
    let document: JsonValue = serde_json::from_slice(bytes)
        .map_err(|err| LoadError::parse(filename, format!("invalid JSON: {err}")))?;
    document_to_dataset(&document, options).map_err(|source| LoadError::schema(filename, source))
}

/// Flattens an already parsed document.
pub fn document_to_dataset(
    document: &JsonValue,
    options: &LoadOptions,
) -> Result<TabularDataset, SchemaError> {
    match document {
        JsonValue::Array(records) => flatten_records(records, ROOT_PATH, &[]),
        JsonValue::Object(object) => {
            let path = match &options.record_path {
                Some(explicit) => Some(explicit_record_path(object, explicit)?),
                None => detect_record_path(document, &options.record_path_candidates),
            };
            match path {
                Some(path) => {
                    debug!("Using '{path}' as the record list");
                    let records = object
                        .get(&path)
                        .and_then(JsonValue::as_array)
                        .ok_or_else(|| SchemaError::RecordPathNotList(path.clone()))?;
                    let metadata = object
                        .iter()
                        .filter(|(key, value)| **key != path && is_scalar(value))
                        .map(|(key, value)| (key.clone(), scalar_to_cell(value)))
                        .collect::<Vec<_>>();
                    flatten_records(records, &path, &metadata)
                }
                None => flatten_records(std::slice::from_ref(document), ROOT_PATH, &[]),
            }
        }
        JsonValue::Null => Err(SchemaError::UnsupportedRoot("null")),
        JsonValue::Bool(_) => Err(SchemaError::UnsupportedRoot("a boolean")),
        JsonValue::Number(_) => Err(SchemaError::UnsupportedRoot("a number")),
        JsonValue::String(_) => Err(SchemaError::UnsupportedRoot("a string")),
    }
}

fn explicit_record_path(object: &Map<String, JsonValue>, path: &str) -> Result<String, SchemaError> {
    match object.get(path) {
        Some(JsonValue::Array(_)) => Ok(path.to_string()),
        Some(_) => Err(SchemaError::RecordPathNotList(path.to_string())),
        None => Err(SchemaError::RecordPathMissing(path.to_string())),
    }
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Builds rows from `records`, appending `metadata` as constant columns.
fn flatten_records(
    records: &[JsonValue],
    path: &str,
    metadata: &[(String, Cell)],
) -> Result<TabularDataset, SchemaError> {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, Cell)>> = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| SchemaError::RecordNotObject {
            path: path.to_string(),
            index,
        })?;
        let mut fields = Vec::new();
        flatten_object(object, "", &mut fields);
        let row = fields
            .into_iter()
            .map(|(name, cell)| {
                let position = *positions.entry(name.clone()).or_insert_with(|| {
                    names.push(name);
                    names.len() - 1
                });
                (position, cell)
            })
            .collect();
        sparse_rows.push(row);
    }

    for (key, _) in metadata {
        if positions.contains_key(key) {
            return Err(SchemaError::MetadataConflict(key.clone()));
        }
    }
    let record_width = names.len();
    names.extend(metadata.iter().map(|(key, _)| key.clone()));

    let rows = sparse_rows
        .into_iter()
        .map(|sparse| {
            let mut row: Vec<Cell> = vec![None; record_width];
            for (position, cell) in sparse {
                row[position] = cell;
            }
            row.extend(metadata.iter().map(|(_, cell)| cell.clone()));
            row
        })
        .collect();

    TabularDataset::from_typed_rows(names, rows)
}

/// Appends `(dotted.name, cell)` pairs for every leaf of `object`. Nested
/// lists are kept whole as compact JSON text.
fn flatten_object(object: &Map<String, JsonValue>, prefix: &str, out: &mut Vec<(String, Cell)>) {
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            JsonValue::Object(inner) => flatten_object(inner, &name, out),
            JsonValue::Array(_) => out.push((name, Some(Value::String(value.to_string())))),
            scalar => out.push((name, scalar_to_cell(scalar))),
        }
    }
}

fn scalar_to_cell(value: &JsonValue) -> Cell {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Boolean(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        JsonValue::String(s) => Some(Value::String(s.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(Value::String(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use serde_json::json;

    fn flatten(document: JsonValue) -> Result<TabularDataset, SchemaError> {
        document_to_dataset(&document, &LoadOptions::default())
    }

    #[test]
    fn nested_objects_use_dotted_names() {
        let ds = flatten(json!([
            {"id": 1, "data": {"image_url": "a.jpg", "size": {"w": 2}}},
            {"id": 2, "data": {"image_url": "b.jpg"}}
        ]))
        .expect("flatten");
        assert_eq!(ds.headers(), vec!["id", "data.image_url", "data.size.w"]);
        assert_eq!(ds.cell(1, "data.size.w"), Some(&None));
    }

    #[test]
    fn nested_lists_are_kept_as_json_text() {
        let ds = flatten(json!([{"id": 1, "labels": [{"label": "cat"}]}])).expect("flatten");
        assert_eq!(
            ds.cell(0, "labels"),
            Some(&Some(Value::String(r#"[{"label":"cat"}]"#.into())))
        );
    }

    #[test]
    fn metadata_columns_follow_record_columns() {
        let ds = flatten(json!({
            "project_id": "p1",
            "tasks": [{"task_id": "t1"}, {"task_id": "t2"}],
            "settings": {"mode": "x"},
            "count": 2
        }))
        .expect("flatten");
        assert_eq!(ds.headers(), vec!["task_id", "project_id", "count"]);
        assert_eq!(ds.cell(1, "project_id"), Some(&Some(Value::String("p1".into()))));
        assert_eq!(ds.columns()[2].datatype, ColumnType::Integer);
    }

    #[test]
    fn flat_object_is_one_row() {
        let ds = flatten(json!({"id": 7, "meta": {"a": true}})).expect("flatten");
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.headers(), vec!["id", "meta.a"]);
    }

    #[test]
    fn mixed_number_kinds_classify_as_float() {
        let ds = flatten(json!([{"v": 1}, {"v": 2.5}, {"v": null}])).expect("flatten");
        assert_eq!(ds.columns()[0].datatype, ColumnType::Float);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = flatten(json!({"items": [{"a": 1}, 5]})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::RecordNotObject {
                path: "items".into(),
                index: 1
            }
        );
    }

    #[test]
    fn metadata_conflict_is_rejected() {
        let err = flatten(json!({"id": "x", "tasks": [{"id": 1}]})).unwrap_err();
        assert_eq!(err, SchemaError::MetadataConflict("id".into()));
    }

    #[test]
    fn explicit_record_path_must_be_a_list() {
        let options = LoadOptions {
            record_path: Some("meta".into()),
            ..LoadOptions::default()
        };
        let doc = json!({"meta": {"a": 1}, "rows": [{"a": 1}]});
        assert_eq!(
            document_to_dataset(&doc, &options).unwrap_err(),
            SchemaError::RecordPathNotList("meta".into())
        );
        let options = LoadOptions {
            record_path: Some("absent".into()),
            ..LoadOptions::default()
        };
        assert_eq!(
            document_to_dataset(&doc, &options).unwrap_err(),
            SchemaError::RecordPathMissing("absent".into())
        );
    }

    #[test]
    fn scalar_root_is_unsupported() {
        assert!(matches!(
            flatten(json!(42)),
            Err(SchemaError::UnsupportedRoot(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load(b"{\"a\": ", "bad.json", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert_eq!(err.filename(), "bad.json");
    }
}
