//! JSON utility functions

use serde_json::Value as JsonValue;

/// Resolve a dot-separated path (`"a.b.c"`) inside a nested JSON value.
///
/// Returns `None` when any segment is missing or the intermediate value is
/// not an object; a missing path is never an error.
pub fn get_nested_value<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Resolve a dot-path and coerce the leaf to a string.
pub fn get_nested_str<'a>(value: &'a JsonValue, path: &str) -> Option<&'a str> {
    get_nested_value(value, path).and_then(|v| v.as_str())
}

/// Resolve a dot-path and coerce the leaf to an integer.
///
/// Instrumentation SDKs are inconsistent about numeric attribute encoding,
/// so numeric strings are accepted too.
pub fn get_nested_i64(value: &JsonValue, path: &str) -> Option<i64> {
    match get_nested_value(value, path)? {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Converts a JsonValue to Option<String>, returning None for null values.
///
/// This prevents serializing `JsonValue::Null` as the string `"null"`,
/// which would be stored as a VARCHAR instead of a database NULL.
pub fn json_to_opt_string(value: &JsonValue) -> Option<String> {
    if value.is_null() {
        None
    } else {
        serde_json::to_string(value).ok()
    }
}

/// Parse a JSON column read back from storage; NULL and malformed text
/// both map to `JsonValue::Null`.
pub fn parse_json_column(raw: &Option<String>) -> JsonValue {
    raw.as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(JsonValue::Null)
}
