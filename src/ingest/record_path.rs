//! Locates the list of repeated records inside a JSON object.
//!
//! Conventional wrapper names are checked first, in order; if none holds a
//! non-empty list, the key with the longest list wins (ties go to the first
//! key in document order). Document order relies on `serde_json` being built
//! with `preserve_order`.

use serde_json::Value as JsonValue;

pub const DEFAULT_RECORD_PATH_CANDIDATES: &[&str] =
    &["tasks", "items", "annotations", "response", "records", "data"];

/// Returns the top-level key holding the record list, or `None` when the
/// document is not an object or holds no list at all.
pub fn detect_record_path<S: AsRef<str>>(document: &JsonValue, candidates: &[S]) -> Option<String> {
    let object = document.as_object()?;

    let named = candidates.iter().map(|c| c.as_ref()).find(|candidate| {
        object
            .get(*candidate)
            .and_then(JsonValue::as_array)
            .is_some_and(|list| !list.is_empty())
    });
    if let Some(name) = named {
        return Some(name.to_string());
    }

    let mut longest: Option<(&String, usize)> = None;
    for (key, value) in object {
        if let Some(list) = value.as_array()
            && longest.is_none_or(|(_, len)| list.len() > len)
        {
            longest = Some((key, list.len()));
        }
    }
    longest.map(|(key, _)| key.clone())
}
