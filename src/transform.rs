//! Per-item response transforms
//!
//! Backends answer in PascalCase (OData) or camelCase with their own field
//! names; resources normalise every item to camelCase before
//! deserializing it.

use crate::types::{JsonObject, JsonValue};

/// Per-item transform applied by list and get calls
pub type TransformFn = fn(JsonValue) -> JsonValue;

/// `CreationTime` -> `creationTime`
pub fn to_camel_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `creationTime` -> `CreationTime`
pub fn to_pascal_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Recursively convert object keys to camelCase.
///
/// Annotation keys such as `@odata.context` are left alone.
pub fn pascal_to_camel_keys(value: JsonValue) -> JsonValue {
    map_keys(value, &to_camel_case)
}

/// Recursively convert object keys to PascalCase, for request bodies
pub fn camel_to_pascal_keys(value: JsonValue) -> JsonValue {
    map_keys(value, &to_pascal_case)
}

/// Rename top-level fields; missing fields are skipped
pub fn rename_fields(value: JsonValue, renames: &[(&str, &str)]) -> JsonValue {
    match value {
        JsonValue::Object(mut map) => {
            for (from, to) in renames {
                if let Some(field) = map.remove(*from) {
                    map.insert((*to).to_string(), field);
                }
            }
            JsonValue::Object(map)
        }
        other => other,
    }
}

fn map_keys(value: JsonValue, convert: &dyn Fn(&str) -> String) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let converted: JsonObject = map
                .into_iter()
                .map(|(key, field)| {
                    let key = if key.starts_with('@') {
                        key
                    } else {
                        convert(&key)
                    };
                    (key, map_keys(field, convert))
                })
                .collect();
            JsonValue::Object(converted)
        }
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(|v| map_keys(v, convert)).collect())
        }
        other => other,
    }
}
