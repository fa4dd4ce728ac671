//! Property classification
//!
//! Each property schema is classified once into a closed set of kinds, so
//! the placeholder policy in the instantiator is an exhaustive match.

use serde_json::Value;

/// How a property schema is instantiated
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind<'a> {
    /// A bare string where a schema was expected; passed through verbatim
    Literal(&'a Value),
    /// `const` value, passed through verbatim
    Const(&'a Value),
    /// `$ref` to be resolved before instantiation
    Ref(&'a str),
    /// `type: "object"`, or an untyped schema with `properties`
    Object,
    /// `type: "array"` with its `prefixItems`, if any
    Array(Option<&'a [Value]>),
    String,
    /// `integer` or `number`
    Integer,
    Boolean,
    /// `oneOf` / `anyOf` alternatives
    Choice(&'a [Value]),
    Unknown,
}

impl<'a> PropertyKind<'a> {
    pub fn classify(schema: &'a Value) -> Self {
        let obj = match schema {
            Value::Object(obj) => obj,
            Value::String(_) => return Self::Literal(schema),
            _ => return Self::Unknown,
        };

        if let Some(value) = obj.get("const") {
            return Self::Const(value);
        }

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return Self::Ref(reference);
        }

        match declared_type(schema) {
            Some("object") => Self::Object,
            Some("array") => Self::Array(
                obj.get("prefixItems")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice),
            ),
            Some("string") => Self::String,
            Some("integer") | Some("number") => Self::Integer,
            Some("boolean") => Self::Boolean,
            Some(_) => Self::Unknown,
            None => {
                if obj.get("properties").map(Value::is_object).unwrap_or(false) {
                    return Self::Object;
                }
                let choices = obj
                    .get("oneOf")
                    .or_else(|| obj.get("anyOf"))
                    .and_then(Value::as_array);
                match choices {
                    Some(options) => Self::Choice(options.as_slice()),
                    None => Self::Unknown,
                }
            }
        }
    }
}

/// The schema's `type`; for a type list the first non-`null` entry
fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}
