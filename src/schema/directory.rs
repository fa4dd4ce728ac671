//! Schema Directory
//!
//! In-memory registry of schema documents keyed by `$id`, with recursive
//! `$ref` resolution. Resolution never fails: dangling references resolve to
//! a visible placeholder and cycles are cut at the first revisit, both
//! reported through [`Diagnostics`].

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::loader::{DocumentLoader, FileSystemLoader, LoadConfig};
use super::merge::merge_definitions;
use super::reference::{qualify_in_place, qualify_local_references, SchemaReference, CURRENT_PATTERN_ID};
use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::Result;

// =============================================================================
// Resolution Trail
// =============================================================================

/// Ordered list of qualified references visited by one top-level resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionTrail {
    references: Vec<String>,
}

impl ResolutionTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `reference`, returning `true` if it had already been visited
    pub fn visit(&mut self, reference: String) -> bool {
        let revisited = self.references.contains(&reference);
        self.references.push(reference);
        revisited
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.references.iter().any(|r| r == reference)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl fmt::Display for ResolutionTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.references.join(" -> "))
    }
}

// =============================================================================
// Schema Directory
// =============================================================================

/// Registry of loaded schemas and the `$ref` resolver over them
///
/// Populate it (bulk load, single registrations, the current pattern) before
/// resolving; resolution only needs `&self` and can run from several threads.
#[derive(Debug, Clone)]
pub struct SchemaDirectory {
    schemas: BTreeMap<String, Value>,
    diagnostics: Diagnostics,
}

impl SchemaDirectory {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            schemas: BTreeMap::new(),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Recursively load every JSON/YAML schema below `dir`.
    ///
    /// Files without `$id` or that fail to parse are skipped with a warning.
    /// A missing or unreadable directory is an error. Returns the number of
    /// schemas registered.
    pub fn load_schemas(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        self.load_from(&FileSystemLoader::new(dir.as_ref()))
    }

    /// Like [`load_schemas`](Self::load_schemas) with explicit loader settings
    pub fn load_schemas_with(&mut self, dir: impl AsRef<Path>, config: LoadConfig) -> Result<usize> {
        self.load_from(&FileSystemLoader::with_config(dir.as_ref(), config))
    }

    /// Register every document a loader produces
    pub fn load_from(&mut self, loader: &dyn DocumentLoader) -> Result<usize> {
        let documents = loader.load_documents(&self.diagnostics)?;
        let mut registered = 0;

        for document in documents {
            let subject = document.path.display().to_string();
            if self.register_document(&subject, document.content).is_some() {
                registered += 1;
            }
        }

        tracing::info!(
            registered,
            total = self.schemas.len(),
            "Loaded schemas into directory"
        );

        Ok(registered)
    }

    /// Register one parsed schema under its `$id`.
    ///
    /// Returns the id, or `None` (with a warning) when the document has none.
    pub fn register_schema(&mut self, document: Value) -> Option<String> {
        self.register_document("<inline>", document)
    }

    fn register_document(&mut self, subject: &str, document: Value) -> Option<String> {
        let Some(id) = document.get("$id").and_then(Value::as_str).map(str::to_string) else {
            self.diagnostics.record(
                subject,
                DiagnosticCode::MissingId,
                "Skipping schema without $id",
            );
            return None;
        };

        self.add_schema(id.clone(), document);
        Some(id)
    }

    /// Register a document under an explicit key. Last registration wins.
    pub fn add_schema(&mut self, schema_id: impl Into<String>, document: Value) {
        let schema_id = schema_id.into();
        if self.schemas.insert(schema_id.clone(), document).is_some() {
            tracing::debug!(schema_id = %schema_id, "Replaced previously registered schema");
        } else {
            tracing::debug!(schema_id = %schema_id, "Registered schema");
        }
    }

    /// Register the document being processed under [`CURRENT_PATTERN_ID`] so
    /// its own `#/...` references resolve.
    pub fn load_current_pattern_as_schema(&mut self, pattern: Value) {
        self.add_schema(CURRENT_PATTERN_ID, pattern);
    }

    /// Look up a schema by id; a miss is reported along with every known id
    pub fn get_schema(&self, schema_id: &str) -> Option<&Value> {
        let schema = self.schemas.get(schema_id);
        if schema.is_none() {
            self.diagnostics.report(
                DiagnosticItem::new(schema_id, DiagnosticCode::MissingSchema, "Schema not found")
                    .with_context(format!("Loaded schemas: {}", self.loaded_schemas().join(", "))),
            );
        }
        schema
    }

    /// Ids of every registered schema, sorted
    pub fn loaded_schemas(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Fully resolve `reference`, relative to the current pattern when local
    pub fn get_definition(&self, reference: &str) -> Value {
        self.get_definition_with_trail(reference).0
    }

    /// [`get_definition`](Self::get_definition), also returning the trail of
    /// references visited on the way
    pub fn get_definition_with_trail(&self, reference: &str) -> (Value, ResolutionTrail) {
        let mut trail = ResolutionTrail::new();
        let definition = self.resolve_recursive(reference, CURRENT_PATTERN_ID, &mut trail);
        (definition, trail)
    }

    /// Resolve a definition that may carry `$ref` alongside sibling keys.
    ///
    /// The referenced definition supplies defaults and the siblings override
    /// it. The result has no top-level `$ref`.
    pub fn resolve_definition(&self, definition: &Value) -> Value {
        match definition.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                let resolved = self.get_definition(reference);
                merge_definitions(&resolved, &without_ref(definition))
            }
            None => definition.clone(),
        }
    }

    fn resolve_recursive(&self, reference: &str, context: &str, trail: &mut ResolutionTrail) -> Value {
        let parsed = SchemaReference::parse(reference);
        let schema_id = parsed.resolve_schema_id(context);
        let revisited = trail.visit(parsed.qualified(context));

        let Some(fragment) = self.lookup(schema_id, parsed.pointer()) else {
            let mut item = DiagnosticItem::new(
                reference,
                DiagnosticCode::UnresolvedRef,
                "Reference could not be resolved",
            )
            .with_context(format!("Resolved against schema: {}", schema_id));
            if !self.schemas.contains_key(schema_id) {
                item = item.with_context(format!("Loaded schemas: {}", self.loaded_schemas().join(", ")));
            }
            self.diagnostics.report(item);
            return missing_definition(reference);
        };

        if revisited {
            self.diagnostics.report(
                DiagnosticItem::new(
                    reference,
                    DiagnosticCode::CircularRef,
                    "Circular reference detected, stopping resolution",
                )
                .with_context(format!("Trail: {}", trail)),
            );
            let mut partial = without_ref(fragment);
            qualify_in_place(&mut partial, schema_id);
            return partial;
        }

        match fragment.get("$ref").and_then(Value::as_str) {
            Some(inner_reference) => {
                let inner = self.resolve_recursive(inner_reference, schema_id, trail);
                let mut outer = without_ref(fragment);
                qualify_in_place(&mut outer, schema_id);
                merge_definitions(&inner, &outer)
            }
            None => qualify_local_references(fragment, schema_id),
        }
    }

    fn lookup(&self, schema_id: &str, pointer: &str) -> Option<&Value> {
        self.schemas.get(schema_id)?.pointer(pointer)
    }
}

/// Placeholder returned for references that cannot be resolved
pub fn missing_definition(reference: &str) -> Value {
    json!({
        "properties": {
            "missing-value": format!("MISSING OBJECT, ref: {} could not be resolved", reference)
        }
    })
}

fn without_ref(definition: &Value) -> Value {
    match definition {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| key.as_str() != "$ref")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CORE: &str = "https://calm.example/core.json";

    fn core_schema() -> Value {
        json!({
            "$id": CORE,
            "defs": {
                "node": {
                    "type": "object",
                    "required": ["unique-id", "node-type", "name"],
                    "properties": {
                        "unique-id": { "type": "string" },
                        "node-type": { "$ref": "#/defs/node-type-definition" },
                        "name": { "type": "string" },
                        "interfaces": {
                            "type": "array",
                            "items": { "$ref": "#/defs/interface" }
                        }
                    }
                },
                "node-type-definition": { "enum": ["service", "database"] },
                "interface": {
                    "type": "object",
                    "properties": { "unique-id": { "type": "string" } }
                },
                "service-node": {
                    "$ref": "#/defs/node",
                    "required": ["unique-id"]
                }
            }
        })
    }

    fn directory() -> SchemaDirectory {
        let mut dir = SchemaDirectory::new(Diagnostics::new());
        dir.register_schema(core_schema());
        dir
    }

    /// Every `$ref` string in `value`, at any depth
    fn collect_refs(value: &Value, refs: &mut Vec<String>) {
        match value {
            Value::Object(obj) => {
                for (key, child) in obj {
                    match child {
                        Value::String(s) if key == "$ref" => refs.push(s.clone()),
                        _ => collect_refs(child, refs),
                    }
                }
            }
            Value::Array(arr) => arr.iter().for_each(|v| collect_refs(v, refs)),
            _ => {}
        }
    }

    #[test]
    fn test_resolves_absolute_reference_and_qualifies_locals() {
        let dir = directory();
        let def = dir.get_definition(&format!("{}#/defs/node", CORE));

        assert_eq!(def["type"], "object");
        assert_eq!(
            def["properties"]["node-type"]["$ref"],
            format!("{}#/defs/node-type-definition", CORE)
        );

        let mut refs = Vec::new();
        collect_refs(&def, &mut refs);
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.starts_with(&format!("{}#", CORE))));
        assert!(dir.diagnostics().is_empty());
    }

    #[test]
    fn test_outer_siblings_override_inner_definition() {
        let dir = directory();
        let def = dir.get_definition(&format!("{}#/defs/service-node", CORE));

        assert_eq!(def["required"], json!(["unique-id"]));
        assert_eq!(def["properties"]["name"]["type"], "string");
        assert!(def.get("$ref").is_none());
    }

    #[test]
    fn test_local_reference_resolves_against_current_pattern() {
        let mut dir = directory();
        dir.load_current_pattern_as_schema(json!({
            "defs": {
                "api": { "$ref": format!("{}#/defs/interface", CORE), "required": ["unique-id"] },
                "uses-local": { "properties": { "x": { "$ref": "#/defs/api" } } }
            }
        }));

        let api = dir.get_definition("#/defs/api");
        assert_eq!(api["properties"]["unique-id"]["type"], "string");
        assert_eq!(api["required"], json!(["unique-id"]));

        let local = dir.get_definition("#/defs/uses-local");
        assert_eq!(local["properties"]["x"]["$ref"], "pattern#/defs/api");
    }

    #[test]
    fn test_missing_schema_and_pointer_yield_placeholder() {
        let dir = directory();

        let missing_schema = dir.get_definition("https://nowhere.example/x.json#/defs/a");
        assert_eq!(
            missing_schema["properties"]["missing-value"],
            "MISSING OBJECT, ref: https://nowhere.example/x.json#/defs/a could not be resolved"
        );

        let missing_pointer = dir.get_definition(&format!("{}#/defs/absent", CORE));
        assert!(missing_pointer["properties"]["missing-value"]
            .as_str()
            .unwrap()
            .starts_with("MISSING OBJECT"));

        assert_eq!(dir.diagnostics().with_code(DiagnosticCode::UnresolvedRef).len(), 2);
    }

    #[test]
    fn test_cycle_terminates_with_bounded_trail() {
        let mut dir = SchemaDirectory::new(Diagnostics::new());
        dir.load_current_pattern_as_schema(json!({
            "defs": {
                "a": { "$ref": "#/defs/b", "title": "a" },
                "b": { "$ref": "#/defs/c", "description": "b" },
                "c": { "$ref": "#/defs/a", "type": "object" }
            }
        }));

        let (def, trail) = dir.get_definition_with_trail("#/defs/a");

        assert_eq!(trail.len(), 4);
        assert_eq!(trail.references()[0], "pattern#/defs/a");
        assert_eq!(trail.references()[3], "pattern#/defs/a");
        assert_eq!(def["title"], "a");
        assert_eq!(def["description"], "b");
        assert_eq!(def["type"], "object");
        assert!(def.get("$ref").is_none());

        let cycles = dir.diagnostics().with_code(DiagnosticCode::CircularRef);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].context[0].contains("pattern#/defs/c"));
    }

    /// `A#/defs/x` refers to `B#/defs/y`; both carry local refs of their own
    fn cross_schema_directory(y_refers_back: bool) -> SchemaDirectory {
        let mut y = json!({ "properties": { "q": { "$ref": "#/defs/z" } } });
        if y_refers_back {
            y["$ref"] = json!("A#/defs/x");
        }

        let mut dir = SchemaDirectory::new(Diagnostics::new());
        dir.register_schema(json!({
            "$id": "A",
            "defs": {
                "x": { "$ref": "B#/defs/y", "properties": { "p": { "$ref": "#/defs/local" } } },
                "local": { "type": "string" }
            }
        }));
        dir.register_schema(json!({
            "$id": "B",
            "defs": { "y": y, "z": { "type": "integer" } }
        }));
        dir
    }

    #[test]
    fn test_locals_qualified_by_owning_schema_at_each_level() {
        let dir = cross_schema_directory(false);

        let def = dir.get_definition("A#/defs/x");

        assert_eq!(def["properties"]["p"]["$ref"], "A#/defs/local");
        assert_eq!(def["properties"]["q"]["$ref"], "B#/defs/z");
        assert!(def.get("$ref").is_none());
        assert!(dir.diagnostics().is_empty());
    }

    #[test]
    fn test_cycle_break_qualifies_revisited_fragment() {
        let dir = cross_schema_directory(true);

        let (def, trail) = dir.get_definition_with_trail("A#/defs/x");

        assert_eq!(trail.references(), ["A#/defs/x", "B#/defs/y", "A#/defs/x"]);
        assert_eq!(def["properties"]["p"]["$ref"], "A#/defs/local");
        assert_eq!(def["properties"]["q"]["$ref"], "B#/defs/z");
        assert!(def.get("$ref").is_none());

        let mut refs = Vec::new();
        collect_refs(&def, &mut refs);
        assert!(refs.iter().all(|r| !r.starts_with('#')));
        assert!(dir.diagnostics().has_code(DiagnosticCode::CircularRef));
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut dir = SchemaDirectory::new(Diagnostics::new());
        dir.load_current_pattern_as_schema(json!({
            "defs": { "loop": { "$ref": "#/defs/loop", "type": "string" } }
        }));

        let (def, trail) = dir.get_definition_with_trail("#/defs/loop");
        assert_eq!(trail.len(), 2);
        assert_eq!(def, json!({ "type": "string" }));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let dir = directory();
        let reference = format!("{}#/defs/service-node", CORE);
        assert_eq!(dir.get_definition(&reference), dir.get_definition(&reference));
    }

    #[test]
    fn test_resolve_definition_merges_siblings() {
        let dir = directory();
        let def = dir.resolve_definition(&json!({
            "$ref": format!("{}#/defs/interface", CORE),
            "properties": { "port": { "type": "integer" } }
        }));

        assert!(def.get("$ref").is_none());
        assert_eq!(def["properties"]["unique-id"]["type"], "string");
        assert_eq!(def["properties"]["port"]["type"], "integer");

        let plain = json!({ "type": "string" });
        assert_eq!(dir.resolve_definition(&plain), plain);
    }

    #[test]
    fn test_registration_requires_id_and_last_wins() {
        let mut dir = SchemaDirectory::new(Diagnostics::new());

        assert_eq!(dir.register_schema(json!({ "type": "object" })), None);
        assert!(dir.diagnostics().has_code(DiagnosticCode::MissingId));

        dir.register_schema(json!({ "$id": "s", "version": 1 }));
        dir.register_schema(json!({ "$id": "s", "version": 2 }));
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get_schema("s").unwrap()["version"], 2);
    }

    #[test]
    fn test_get_schema_miss_lists_loaded_ids() {
        let dir = directory();
        assert!(dir.get_schema("unknown").is_none());

        let misses = dir.diagnostics().with_code(DiagnosticCode::MissingSchema);
        assert_eq!(misses.len(), 1);
        assert!(misses[0].context[0].contains(CORE));
        assert_eq!(dir.loaded_schemas(), vec![CORE]);
    }
}
