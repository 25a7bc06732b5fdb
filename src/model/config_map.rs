// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

/// A checked configuration blob: always a JSON object.
pub type ConfigMap = Map<String, Value>;

/// Converts a stored blob into a [`ConfigMap`]. `null` is read as empty; any
/// other non-object value is rejected.
pub fn config_map_from_value(value: &Value) -> Option<ConfigMap> {
    match value {
        Value::Null => Some(ConfigMap::new()),
        Value::Object(map) => Some(map.clone()),
        _ => None,
    }
}

/// Merges `overlay` into `base`. Keys from `overlay` win; when both sides hold
/// an object under the same key the objects are merged recursively.
pub fn merge_config(base: &mut ConfigMap, overlay: &ConfigMap) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_config(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Folds layers from lowest to highest precedence.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a ConfigMap>) -> ConfigMap {
    let mut merged = ConfigMap::new();
    for layer in layers {
        merge_config(&mut merged, layer);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ConfigMap {
        config_map_from_value(&value).unwrap()
    }

    #[test]
    fn later_layers_win() {
        let defaults = map(json!({"model": "small", "temperature": 0.2}));
        let params = map(json!({"temperature": 0.5}));
        let overrides = map(json!({"model": "large"}));

        let merged = merge_layers([&defaults, &params, &overrides]);

        assert_eq!(Value::Object(merged), json!({"model": "large", "temperature": 0.5}));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let mut base = map(json!({"limits": {"tokens": 100, "retries": 2}}));
        let overlay = map(json!({"limits": {"retries": 5}}));

        merge_config(&mut base, &overlay);

        assert_eq!(Value::Object(base), json!({"limits": {"tokens": 100, "retries": 5}}));
    }

    #[test]
    fn non_object_replaces_object() {
        let mut base = map(json!({"limits": {"tokens": 100}}));
        let overlay = map(json!({"limits": null}));

        merge_config(&mut base, &overlay);

        assert_eq!(base.get("limits"), Some(&Value::Null));
    }

    #[test]
    fn blobs_must_be_objects() {
        assert_eq!(config_map_from_value(&Value::Null), Some(ConfigMap::new()));
        assert!(config_map_from_value(&json!([1, 2])).is_none());
        assert!(config_map_from_value(&json!("text")).is_none());
    }
}
