//! Recursive deep merge of override values onto defaults.

use serde_json::Value;

/// Merges `overrides` onto `defaults`, last-writer-wins per leaf.
///
/// When both sides hold a plain (non-array) object for the same key the
/// merge recurses; in every other case the override value wins outright,
/// including when it sets a key to a primitive, array, or `null` that
/// the default had as an object. Arrays are never merged element-wise.
///
/// Keys present only in `defaults` survive, which is how new default
/// fields reach old settings documents without clobbering user
/// customizations.
pub fn deep_merge(defaults: &Value, overrides: &Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(default_map), Value::Object(override_map)) => {
            let mut merged = default_map.clone();
            for (key, override_value) in override_map {
                let value = match default_map.get(key) {
                    Some(default_value) => deep_merge(default_value, override_value),
                    None => override_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn override_wins_per_leaf() {
        let defaults = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let overrides = json!({"b": {"c": 99}});
        let merged = deep_merge(&defaults, &overrides);
        assert_eq!(merged, json!({"a": 1, "b": {"c": 99, "d": 3}}));
    }

    #[test]
    fn missing_keys_filled_from_defaults() {
        let defaults = json!({"enabled": false, "timeout": 10});
        let overrides = json!({"enabled": true});
        let merged = deep_merge(&defaults, &overrides);
        assert_eq!(merged, json!({"enabled": true, "timeout": 10}));
    }

    #[test]
    fn arrays_replace_not_merge() {
        let defaults = json!({"recipients": ["a", "b", "c"]});
        let overrides = json!({"recipients": ["z"]});
        assert_eq!(
            deep_merge(&defaults, &overrides),
            json!({"recipients": ["z"]})
        );
    }

    #[test]
    fn override_may_demote_object_to_scalar_or_null() {
        let defaults = json!({"nested": {"x": 1}, "other": {"y": 2}});
        let overrides = json!({"nested": "flat", "other": null});
        assert_eq!(
            deep_merge(&defaults, &overrides),
            json!({"nested": "flat", "other": null})
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let defaults = json!({"a": {"b": 1, "c": [1, 2]}, "d": "x"});
        let settings = json!({"a": {"b": 7}, "extra": true});
        let once = deep_merge(&defaults, &settings);
        // Re-merging the result against the same defaults changes nothing.
        assert_eq!(deep_merge(&defaults, &once), once);
        assert_eq!(deep_merge(&once, &settings), once);
    }
}
