// Field lookup over untyped request payloads (body, query, user records)
use serde_json::Value;

/// Resolve `field_path` inside `container`
///
/// An exact key match wins, so a key that itself contains dots is still found.
/// Otherwise the path is split on `.` and each segment descends one object level.
/// Returns `None` when a segment is missing or the value at that point is not an object.
#[must_use]
pub fn lookup<'a>(container: &'a Value, field_path: &str) -> Option<&'a Value> {
    let object = container.as_object()?;
    if let Some(value) = object.get(field_path) {
        return Some(value);
    }

    if !field_path.contains('.') {
        return None;
    }

    field_path
        .split('.')
        .try_fold(container, |current, segment| current.as_object()?.get(segment))
}

/// Like [`lookup`], but `null` and empty strings count as absent
#[must_use]
pub fn lookup_present<'a>(container: &'a Value, field_path: &str) -> Option<&'a Value> {
    lookup(container, field_path).filter(|value| !is_blank(value))
}

/// Try each container in order and return the first present value
#[must_use]
pub fn lookup_first<'a>(containers: &[&'a Value], field_path: &str) -> Option<&'a Value> {
    containers
        .iter()
        .find_map(|container| lookup_present(*container, field_path))
}

/// Render a scalar as the string a provider or token field expects
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
