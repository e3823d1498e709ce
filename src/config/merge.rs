//! Configuration merge logic
//!
//! Implements the layer merge with:
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive), keeping the base key order
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_value = std::mem::take(slot);
                        *slot = deep_merge(base_value, overlay_value);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Object(base_map)
        }

        // Arrays: REPLACE (no concatenation)
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"chain": {"max_depth": 64}});
        let overlay = json!({"chain": {"max_depth": 8}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["chain"]["max_depth"], 8);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "interpolation": {
                "mode": "lenient",
                "max_depth": 32
            }
        });
        let overlay = json!({
            "interpolation": {
                "mode": "strict"
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["interpolation"]["mode"], "strict");
        assert_eq!(result["interpolation"]["max_depth"], 32);
    }

    #[test]
    fn test_array_replace() {
        let base = json!({
            "profiles": {"active": ["a", "b", "c"]}
        });
        let overlay = json!({
            "profiles": {"active": ["x"]}
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["profiles"]["active"], json!(["x"]));
    }

    #[test]
    fn test_add_new_key() {
        let base = json!({"a": 1});
        let overlay = json!({"b": 2});
        let result = deep_merge(base, overlay);

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn test_null_override() {
        let base = json!({"value": 100});
        let overlay = json!({"value": null});
        let result = deep_merge(base, overlay);

        assert!(result["value"].is_null());
    }

    #[test]
    fn test_key_order_kept() {
        let base = json!({"z": 1, "a": {"q": 1}, "m": 3});
        let overlay = json!({"a": {"q": 2}, "new": 4});
        let result = deep_merge(base, overlay);

        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m", "new"]);
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "chain": {"max_depth": 64},
            "interpolation": {"mode": "lenient"}
        });
        let user = json!({
            "chain": {"max_depth": 16}
        });
        let project = json!({
            "interpolation": {"mode": "strict"}
        });
        let overrides = json!({
            "chain": {"max_depth": 4}
        });

        let result = merge_layers(vec![builtin, user, project, overrides]);

        assert_eq!(result["chain"]["max_depth"], 4);
        assert_eq!(result["interpolation"]["mode"], "strict");
    }
}
