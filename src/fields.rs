use serde_json::Value;

/// Display value used when a dot-path does not resolve inside an object.
pub const NOT_FOUND: &str = "n/a";

/// Resolves a `.`-separated path against a nested JSON document.
///
/// Returns `None` when any intermediate segment is missing or the walk hits a
/// non-object value with path segments remaining. Missing fields are an
/// expected condition for arbitrary resources, not an error.
pub fn extract<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = object;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Renders an extracted value into a table cell.
///
/// Scalars render bare, nested objects and arrays render as their compact
/// JSON dump. Absent values render as the `"n/a"` sentinel.
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => NOT_FOUND.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) => "null".to_string(),
        Some(scalar @ (Value::Bool(_) | Value::Number(_))) => scalar.to_string(),
        Some(structured) => serde_json::to_string(structured).unwrap_or_else(|_| NOT_FOUND.to_string()),
    }
}
