//! Canonical schema hashing and file content hashing.
//!
//! The schema hash must be insensitive to key order and formatting but
//! sensitive to every value, so the document is re-serialized with
//! recursively sorted keys before hashing.
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hash a schema document. Two documents that differ only in key order
/// or whitespace produce the same hash.
pub fn schema_hash(value: &Value) -> String {
    sha256_hex(canonical_json(value).as_bytes())
}

/// Serialize with recursively sorted object keys, compact separators.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_default()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            serde_json::to_value(sorted).unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_the_hash() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"y": 2, "x": 3}}"#).expect("json");
        let b: Value = serde_json::from_str(r#"{"a": {"x": 3, "y": 2}, "b": 1}"#).expect("json");
        assert_eq!(schema_hash(&a), schema_hash(&b));
    }

    #[test]
    fn whitespace_does_not_change_the_hash() {
        let a: Value = serde_json::from_str("{\"a\": [1, 2]}").expect("json");
        let b: Value = serde_json::from_str("{ \"a\" : [ 1 , 2 ] }").expect("json");
        assert_eq!(schema_hash(&a), schema_hash(&b));
    }

    #[test]
    fn value_changes_change_the_hash() {
        assert_ne!(
            schema_hash(&json!({"a": 1})),
            schema_hash(&json!({"a": 2}))
        );
        // Array order is semantic, unlike key order.
        assert_ne!(
            schema_hash(&json!({"a": [1, 2]})),
            schema_hash(&json!({"a": [2, 1]}))
        );
    }
}
