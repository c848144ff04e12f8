//! Dot-notation lookup into nested JSON data sources.

use serde_json::Value;

/// Resolves `path` ("a.b.0.c") against `value`.
///
/// Objects index by key, arrays by numeric segment. Returns `None` the moment a segment is
/// missing or the current value is null or a primitive. Never panics.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        return None;
    }
    Some(current)
}
