//! Placeholder Instantiation
//!
//! Walks resolved pattern definitions and produces a synthetic architecture
//! document: constants pass through, strings become `{{ NAME }}` tokens,
//! numbers become `-1`, nested objects and `prefixItems` arrays recurse.
//!
//! The same walk serves nodes, relationships, metadata and interfaces; the
//! label only feeds diagnostics and top-level placeholder names.

pub mod placeholder;
pub mod property;

pub use placeholder::{placeholder_name, INTEGER_SENTINEL};
pub use property::PropertyKind;

use serde_json::{Map, Value};

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::schema::{SchemaDirectory, SchemaReference, CURRENT_PATTERN_ID};
use placeholder::{boolean_placeholder, integer_placeholder, string_placeholder};

/// Properties emitted even when the definition does not list them as required
pub const ALWAYS_EMITTED: &[&str] = &["interfaces"];

/// Instantiates pattern definitions against a populated [`SchemaDirectory`]
pub struct Instantiator<'a> {
    directory: &'a SchemaDirectory,
    diagnostics: Diagnostics,
    instantiate_all: bool,
}

impl<'a> Instantiator<'a> {
    pub fn new(directory: &'a SchemaDirectory, diagnostics: Diagnostics) -> Self {
        Self {
            directory,
            diagnostics,
            instantiate_all: false,
        }
    }

    /// Emit optional properties too, not only those listed in `required`
    pub fn instantiate_all(mut self, instantiate_all: bool) -> Self {
        self.instantiate_all = instantiate_all;
        self
    }

    // -------------------------------------------------------------------------
    // Generic walk
    // -------------------------------------------------------------------------

    /// Instantiate an object-shaped definition.
    ///
    /// A definition without `properties` yields `{}`.
    pub fn instantiate_generic_object(&self, definition: &Value, label: &str, path: &str) -> Value {
        let mut active = Vec::new();
        self.walk_object(definition, label, path, &mut active)
    }

    pub fn instantiate_node(&self, definition: &Value) -> Value {
        self.instantiate_generic_object(definition, "node", "nodes")
    }

    pub fn instantiate_relationship(&self, definition: &Value) -> Value {
        self.instantiate_generic_object(definition, "relationship", "relationships")
    }

    pub fn instantiate_interface(&self, definition: &Value) -> Value {
        self.instantiate_generic_object(definition, "interface", "interfaces")
    }

    /// Instantiate one metadata definition, which may also be a bare string
    pub fn instantiate_metadata_object(&self, definition: &Value) -> Value {
        let mut active = Vec::new();
        self.value_for("metadata", definition, "metadata", &mut active)
    }

    fn walk_object(&self, definition: &Value, label: &str, path: &str, active: &mut Vec<String>) -> Value {
        if let Some(reference) = definition.get("$ref").and_then(Value::as_str) {
            return self.within_reference(reference, definition, path, active, |this, resolved, active| {
                this.walk_properties(resolved, label, path, active)
            });
        }
        self.walk_properties(definition, label, path, active)
    }

    fn walk_properties(&self, definition: &Value, label: &str, path: &str, active: &mut Vec<String>) -> Value {
        let mut instance = Map::new();

        let Some(properties) = definition.get("properties").and_then(Value::as_object) else {
            tracing::debug!(label, path, "Definition has no properties");
            return Value::Object(instance);
        };

        let required: Option<Vec<&str>> = definition
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect());

        for (key, property_schema) in properties {
            if !self.should_emit(key, required.as_deref()) {
                continue;
            }
            let child_path = format!("{}/{}", path, key);
            let value = self.value_for(key, property_schema, &child_path, active);
            instance.insert(key.clone(), value);
        }

        Value::Object(instance)
    }

    fn should_emit(&self, key: &str, required: Option<&[&str]>) -> bool {
        if self.instantiate_all || ALWAYS_EMITTED.contains(&key) {
            return true;
        }
        match required {
            Some(required) => required.contains(&key),
            None => true,
        }
    }

    fn value_for(&self, key: &str, schema: &Value, path: &str, active: &mut Vec<String>) -> Value {
        match PropertyKind::classify(schema) {
            PropertyKind::Literal(value) | PropertyKind::Const(value) => value.clone(),
            PropertyKind::Ref(reference) => {
                self.within_reference(reference, schema, path, active, |this, resolved, active| {
                    this.value_for(key, resolved, path, active)
                })
            }
            PropertyKind::Object => self.walk_properties(schema, key, path, active),
            PropertyKind::Array(Some(items)) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.value_for(key, item, &format!("{}/{}", path, i), active))
                    .collect(),
            ),
            PropertyKind::Array(None) => Value::Array(Vec::new()),
            PropertyKind::String | PropertyKind::Unknown => string_placeholder(key),
            PropertyKind::Integer => integer_placeholder(),
            PropertyKind::Boolean => boolean_placeholder(key),
            PropertyKind::Choice(options) => match options.first() {
                Some(first) => self.value_for(key, first, path, active),
                None => string_placeholder(key),
            },
        }
    }

    /// Resolve `definition`'s `$ref`, merge its siblings, and run `f` on the
    /// result, refusing to re-enter a reference already being instantiated.
    fn within_reference<F>(
        &self,
        reference: &str,
        definition: &Value,
        path: &str,
        active: &mut Vec<String>,
        f: F,
    ) -> Value
    where
        F: FnOnce(&Self, &Value, &mut Vec<String>) -> Value,
    {
        let qualified = SchemaReference::parse(reference).qualified(CURRENT_PATTERN_ID);
        if active.contains(&qualified) {
            self.diagnostics.report(
                DiagnosticItem::new(
                    reference,
                    DiagnosticCode::CircularRef,
                    "Definition refers back to itself, emitting an empty object",
                )
                .with_context(format!("Path: {}", path))
                .with_context(format!("Active: {}", active.join(" -> "))),
            );
            return Value::Object(Map::new());
        }

        active.push(qualified);
        let resolved = self.directory.resolve_definition(definition);
        let value = f(self, &resolved, active);
        active.pop();
        value
    }

    // -------------------------------------------------------------------------
    // Pattern collections
    // -------------------------------------------------------------------------

    /// Definitions listed under `pattern.properties.<collection>.prefixItems`
    fn collection_definitions(&self, pattern: &Value, collection: &str) -> Vec<Value> {
        let Some(section) = pattern.get("properties").and_then(|p| p.get(collection)) else {
            self.diagnostics.record(
                collection,
                DiagnosticCode::MissingCollection,
                format!("Pattern defines no {}", collection),
            );
            return Vec::new();
        };
        let section = self.directory.resolve_definition(section);

        match section.get("prefixItems").and_then(Value::as_array) {
            Some(items) => items.clone(),
            None if section.get("items").is_some() => {
                self.diagnostics.record(
                    collection,
                    DiagnosticCode::DeprecatedItems,
                    format!(
                        "Pattern uses 'items' for {}; only 'prefixItems' is instantiated",
                        collection
                    ),
                );
                Vec::new()
            }
            None => {
                self.diagnostics.record(
                    collection,
                    DiagnosticCode::MissingCollection,
                    format!("Pattern has no prefixItems for {}", collection),
                );
                Vec::new()
            }
        }
    }

    fn instantiate_collection(&self, pattern: &Value, collection: &str, label: &str) -> Vec<Value> {
        let definitions = self.collection_definitions(pattern, collection);
        tracing::debug!(collection, count = definitions.len(), "Instantiating collection");

        definitions
            .iter()
            .enumerate()
            .map(|(i, definition)| {
                self.instantiate_generic_object(definition, label, &format!("{}/{}", collection, i))
            })
            .collect()
    }

    pub fn instantiate_nodes(&self, pattern: &Value) -> Vec<Value> {
        self.instantiate_collection(pattern, "nodes", "node")
    }

    pub fn instantiate_relationships(&self, pattern: &Value) -> Vec<Value> {
        self.instantiate_collection(pattern, "relationships", "relationship")
    }

    pub fn instantiate_all_metadata(&self, pattern: &Value) -> Vec<Value> {
        self.collection_definitions(pattern, "metadata")
            .iter()
            .map(|definition| self.instantiate_metadata_object(definition))
            .collect()
    }

    /// Assemble a complete placeholder architecture for `pattern`.
    ///
    /// `$schema` is the pattern's `$id` when it has one; `metadata` is only
    /// present when the pattern defines it.
    pub fn instantiate_architecture(&self, pattern: &Value) -> Value {
        let mut architecture = Map::new();

        if let Some(id) = pattern.get("$id").filter(|id| id.is_string()) {
            architecture.insert("$schema".to_string(), id.clone());
        }
        architecture.insert("nodes".to_string(), Value::Array(self.instantiate_nodes(pattern)));
        architecture.insert(
            "relationships".to_string(),
            Value::Array(self.instantiate_relationships(pattern)),
        );

        let has_metadata = pattern
            .get("properties")
            .and_then(|p| p.get("metadata"))
            .is_some();
        if has_metadata {
            architecture.insert(
                "metadata".to_string(),
                Value::Array(self.instantiate_all_metadata(pattern)),
            );
        }

        Value::Object(architecture)
    }
}
