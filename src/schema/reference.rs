//! Schema References
//!
//! A reference has the form `[schemaId]#[pointer]`. An empty schema id makes
//! the reference local: it resolves against whichever schema holds it.

use serde_json::Value;

/// Registry key of the document currently being processed
pub const CURRENT_PATTERN_ID: &str = "pattern";

/// A parsed `$ref` string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReference<'a> {
    schema_id: &'a str,
    pointer: &'a str,
}

impl<'a> SchemaReference<'a> {
    /// Split a reference at its first `#`.
    ///
    /// A reference without `#` names a whole schema.
    pub fn parse(reference: &'a str) -> Self {
        match reference.split_once('#') {
            Some((schema_id, pointer)) => Self { schema_id, pointer },
            None => Self {
                schema_id: reference,
                pointer: "",
            },
        }
    }

    /// Schema id part (empty for local references)
    pub fn schema_id(&self) -> &'a str {
        self.schema_id
    }

    /// JSON pointer part, without the leading `#`
    pub fn pointer(&self) -> &'a str {
        self.pointer
    }

    pub fn is_local(&self) -> bool {
        self.schema_id.is_empty()
    }

    /// The schema id this reference resolves against from `context`
    pub fn resolve_schema_id<'c>(&self, context: &'c str) -> &'c str
    where
        'a: 'c,
    {
        if self.is_local() {
            context
        } else {
            self.schema_id
        }
    }

    /// Absolute `schemaId#pointer` form of this reference seen from `context`
    pub fn qualified(&self, context: &str) -> String {
        format!("{}#{}", self.resolve_schema_id(context), self.pointer)
    }
}

/// Rewrite every local `$ref` (`#/...`) inside `definition` to
/// `<schema_id>#/...`.
///
/// Only string values stored directly under a `$ref` key are touched; the
/// input is left unchanged.
pub fn qualify_local_references(definition: &Value, schema_id: &str) -> Value {
    let mut qualified = definition.clone();
    qualify_in_place(&mut qualified, schema_id);
    qualified
}

pub(crate) fn qualify_in_place(value: &mut Value, schema_id: &str) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = child {
                        if reference.starts_with('#') {
                            *reference = format!("{}{}", schema_id, reference);
                        }
                        continue;
                    }
                }
                qualify_in_place(child, schema_id);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                qualify_in_place(item, schema_id);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_local_reference() {
        let reference = SchemaReference::parse("#/defs/node");
        assert!(reference.is_local());
        assert_eq!(reference.pointer(), "/defs/node");
        assert_eq!(reference.resolve_schema_id(CURRENT_PATTERN_ID), "pattern");
        assert_eq!(reference.qualified("pattern"), "pattern#/defs/node");
    }

    #[test]
    fn test_parse_absolute_reference() {
        let reference = SchemaReference::parse("https://calm.example/core.json#/defs/node");
        assert!(!reference.is_local());
        assert_eq!(reference.schema_id(), "https://calm.example/core.json");
        assert_eq!(reference.resolve_schema_id("pattern"), "https://calm.example/core.json");
        assert_eq!(
            reference.qualified("pattern"),
            "https://calm.example/core.json#/defs/node"
        );
    }

    #[test]
    fn test_parse_whole_schema_reference() {
        let reference = SchemaReference::parse("https://calm.example/interface.json");
        assert_eq!(reference.schema_id(), "https://calm.example/interface.json");
        assert_eq!(reference.pointer(), "");
    }

    #[test]
    fn test_qualify_nested_local_references() {
        let definition = json!({
            "properties": {
                "interfaces": {
                    "type": "array",
                    "items": { "$ref": "#/defs/interface" }
                },
                "owner": { "$ref": "https://other.example/owner.json#/defs/owner" }
            },
            "anyOf": [ { "$ref": "#/defs/a" }, { "$ref": "#/defs/b" } ],
            "description": "#/not/a/ref"
        });

        let qualified = qualify_local_references(&definition, "https://calm.example/core.json");

        assert_eq!(
            qualified["properties"]["interfaces"]["items"]["$ref"],
            "https://calm.example/core.json#/defs/interface"
        );
        assert_eq!(
            qualified["properties"]["owner"]["$ref"],
            "https://other.example/owner.json#/defs/owner"
        );
        assert_eq!(qualified["anyOf"][1]["$ref"], "https://calm.example/core.json#/defs/b");
        assert_eq!(qualified["description"], "#/not/a/ref");
        // Input untouched
        assert_eq!(definition["anyOf"][0]["$ref"], "#/defs/a");
    }

    #[test]
    fn test_qualify_leaves_non_string_ref_keys() {
        let definition = json!({ "properties": { "$ref": { "type": "string", "$ref": "#/x" } } });
        let qualified = qualify_local_references(&definition, "s");
        assert_eq!(qualified["properties"]["$ref"]["$ref"], "s#/x");
    }
}
