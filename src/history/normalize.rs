// src/history/normalize.rs
//! Shared field-alias rules for the mirrors' inconsistent vocabularies.

use serde_json::Value;

use super::types::VersionRecord;

const VERSION_KEYS: [&str; 3] = ["bundle_version", "version", "Version"];
const VERSION_ID_KEYS: [&str; 3] = ["external_identifier", "versionid", "versionId"];

/// Classification of a decoded upstream payload, done before any field access.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Valid(T),
    /// Upstream answered, but has nothing for this app.
    Empty,
    Malformed(String),
}

/// Read `key` as a non-empty string. Numbers are rendered; anything else is absent.
pub fn text_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alias present wins.
pub fn first_field(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text_field(obj, k))
}

/// Accept an entry only when both a version label and a version id are present.
pub fn normalize_entry(item: &Value) -> Option<VersionRecord> {
    let version = first_field(item, &VERSION_KEYS)?;
    let version_id = first_field(item, &VERSION_ID_KEYS)?;
    Some(VersionRecord {
        version,
        version_id,
    })
}

/// Normalize every entry of a JSON array; failing entries are dropped.
pub fn normalize_array(items: &[Value]) -> Vec<VersionRecord> {
    items.iter().filter_map(normalize_entry).collect()
}

/// Classify the `data` list most mirrors wrap their history in.
/// Missing or null → Empty; present but not an array → Malformed.
pub fn classify_list(value: Option<&Value>) -> Payload<&Vec<Value>> {
    match value {
        None | Some(Value::Null) => Payload::Empty,
        Some(Value::Array(items)) if items.is_empty() => Payload::Empty,
        Some(Value::Array(items)) => Payload::Valid(items),
        Some(other) => Payload::Malformed(format!("expected array, got {}", kind(other))),
    }
}

pub fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
