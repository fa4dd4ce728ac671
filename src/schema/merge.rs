//! Schema Merging
//!
//! Deep, right-biased combination of two definitions: the overlay (the more
//! specific definition that carried the `$ref`) wins on key collisions.
//! Nested objects merge recursively; arrays and scalars are replaced whole.

use serde_json::Value;

/// Merge `overlay` over `base`, returning a new definition.
///
/// Keys from `base` keep their position; keys only present in `overlay` are
/// appended in overlay order.
pub fn merge_definitions(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// In-place variant of [`merge_definitions`]
pub fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            for (key, overlay_value) in overlay_obj {
                match base_obj.get_mut(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        merge_into(base_value, overlay_value);
                    }
                    Some(base_value) => {
                        *base_value = overlay_value.clone();
                    }
                    None => {
                        base_obj.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_wins_on_scalars_and_arrays() {
        let base = json!({
            "type": "object",
            "required": ["unique-id", "node-type", "name"],
            "properties": { "name": { "type": "string" } }
        });
        let overlay = json!({ "required": ["unique-id"] });

        let merged = merge_definitions(&base, &overlay);

        assert_eq!(merged["required"], json!(["unique-id"]));
        assert_eq!(merged["type"], "object");
        assert_eq!(merged["properties"]["name"]["type"], "string");
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let base = json!({
            "properties": {
                "unique-id": { "type": "string" },
                "node-type": { "type": "string" }
            }
        });
        let overlay = json!({
            "properties": {
                "node-type": { "const": "service" },
                "extra": { "type": "boolean" }
            }
        });

        let merged = merge_definitions(&base, &overlay);
        let props = merged["properties"].as_object().unwrap();

        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["unique-id", "node-type", "extra"]);
        assert_eq!(props["node-type"], json!({ "type": "string", "const": "service" }));
    }

    #[test]
    fn test_non_object_base_is_replaced() {
        let merged = merge_definitions(&json!("MISSING"), &json!({ "type": "string" }));
        assert_eq!(merged, json!({ "type": "string" }));

        let merged = merge_definitions(&json!({ "a": 1 }), &json!([1, 2]));
        assert_eq!(merged, json!([1, 2]));
    }
}
