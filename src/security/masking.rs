//! Key-based redaction of JSON structures.
//!
//! # Responsibilities
//! - Replace values of configured keys with asterisks of equal length
//! - Recurse into nested objects and arrays
//! - Leave structure and all other values untouched
//!
//! # Design Decisions
//! - Pure: takes a borrowed value, returns a new one
//! - Length is measured in chars of the value's string form
//!   (strings: their text, anything else: compact JSON)
//! - An empty key set is an explicit opt-out and returns the input as-is

use std::collections::HashSet;
use serde_json::{Map, Value};

/// Return `data` with every object entry whose key is in `hidden_keys` masked.
pub fn mask(data: &Value, hidden_keys: &HashSet<String>) -> Value {
    if hidden_keys.is_empty() {
        return data.clone();
    }
    mask_value(data, hidden_keys)
}

/// Owned variant of [`mask`], avoiding a copy when masking is disabled.
pub fn mask_owned(data: Value, hidden_keys: &HashSet<String>) -> Value {
    if hidden_keys.is_empty() {
        return data;
    }
    mask_value(&data, hidden_keys)
}

fn mask_value(data: &Value, hidden_keys: &HashSet<String>) -> Value {
    match data {
        Value::Object(map) => {
            let mut masked = Map::with_capacity(map.len());
            for (key, value) in map {
                let value = if hidden_keys.contains(key) {
                    Value::String(asterisks_for(value))
                } else {
                    mask_value(value, hidden_keys)
                };
                masked.insert(key.clone(), value);
            }
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| mask_value(v, hidden_keys)).collect()),
        other => other.clone(),
    }
}

fn asterisks_for(value: &Value) -> String {
    let len = match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    };
    asterisks(len)
}

/// A string of `len` asterisks.
pub fn asterisks(len: usize) -> String {
    "*".repeat(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn keys(list: &[&str]) -> HashSet<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_masks_nested_keys() {
        let data = json!({
            "user": "alice",
            "password": "hunter2",
            "profile": {
                "ssn": "123-45-6789",
                "cards": [{"cc": 4111111111111111u64, "label": "main"}]
            }
        });

        let masked = mask(&data, &keys(&["password", "ssn", "cc"]));

        assert_eq!(masked["user"], "alice");
        assert_eq!(masked["password"], "*******");
        assert_eq!(masked["profile"]["ssn"], "***********");
        assert_eq!(masked["profile"]["cards"][0]["cc"], "****************");
        assert_eq!(masked["profile"]["cards"][0]["label"], "main");
    }

    #[test]
    fn test_hidden_container_is_masked_whole() {
        let data = json!({"secret": {"a": 1}});
        let masked = mask(&data, &keys(&["secret"]));
        assert_eq!(masked["secret"], "*******"); // {"a":1}
    }

    #[test]
    fn test_char_length_not_byte_length() {
        let data = json!({"pwd": "pässwörd"});
        let masked = mask(&data, &keys(&["pwd"]));
        assert_eq!(masked["pwd"], "********");
    }

    #[test]
    fn test_scalars_pass_through() {
        let hidden = keys(&["password"]);
        assert_eq!(mask(&json!(42), &hidden), json!(42));
        assert_eq!(mask(&json!("password"), &hidden), json!("password"));
        assert_eq!(mask(&Value::Null, &hidden), Value::Null);
    }

    #[test]
    fn test_empty_keys_is_noop() {
        let data = json!({"password": "x", "nested": [{"password": "y"}]});
        assert_eq!(mask(&data, &HashSet::new()), data);
        assert_eq!(mask_owned(data.clone(), &HashSet::new()), data);
    }

    fn flat_object() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(
            "[a-z]{1,6}",
            prop_oneof![
                any::<i64>().prop_map(Value::from),
                any::<bool>().prop_map(Value::from),
                ".{0,12}".prop_map(Value::from),
            ],
            0..8,
        )
        .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_mask_preserves_keys_and_lengths(
            object in flat_object(),
            hidden in prop::collection::hash_set("[a-z]{1,6}", 0..4),
        ) {
            let data = Value::Object(object.clone());
            let masked = mask(&data, &hidden);
            let masked = masked.as_object().unwrap();

            prop_assert_eq!(masked.len(), object.len());
            for (key, original) in &object {
                let value = &masked[key];
                if hidden.contains(key) {
                    let text = value.as_str().unwrap();
                    prop_assert!(text.chars().all(|c| c == '*'));
                    let expected = match original {
                        Value::String(s) => s.chars().count(),
                        other => other.to_string().chars().count(),
                    };
                    prop_assert_eq!(text.chars().count(), expected);
                } else {
                    prop_assert_eq!(value, original);
                }
            }
        }

        #[test]
        fn prop_empty_key_set_is_identity(object in flat_object()) {
            let data = Value::Object(object);
            prop_assert_eq!(mask(&data, &HashSet::new()), data);
        }
    }
}
