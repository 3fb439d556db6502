// Deep merge of JSON option objects.

use serde_json::Value;

/// Merge `overlay` onto `base`. Objects merge key by key at every depth;
/// any other overlay value replaces what `base` held.
pub(crate) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_wins_at_every_depth() {
        let mut base = json!({
            "type": "bigInt",
            "uiSchema": { "type": "number", "x-component": "InputNumber", "title": "Integer" }
        });
        merge_values(
            &mut base,
            json!({ "name": "age", "uiSchema": { "title": "Age" } }),
        );

        assert_eq!(
            base,
            json!({
                "type": "bigInt",
                "uiSchema": { "type": "number", "x-component": "InputNumber", "title": "Age" },
                "name": "age"
            })
        );
    }

    #[test]
    fn non_object_overlay_replaces() {
        let mut base = json!({ "enum": [1, 2] });
        merge_values(&mut base, json!({ "enum": [3] }));
        assert_eq!(base, json!({ "enum": [3] }));
    }
}
