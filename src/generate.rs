//! Generate Flow
//!
//! Loads a pattern's schema dependencies and instantiates a placeholder
//! architecture document from it.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::instantiate::Instantiator;
use crate::schema::{FileSystemLoader, SchemaDirectory};

/// Build a [`SchemaDirectory`] for `pattern`.
///
/// Bulk-loads `config.schemas.directory` when set, then registers the
/// pattern under `"pattern"` and, if it has one, under its own `$id`.
pub fn prepare_directory(pattern: &Value, config: &EngineConfig, diagnostics: &Diagnostics) -> Result<SchemaDirectory> {
    let mut directory = SchemaDirectory::new(diagnostics.clone());

    if let Some(schema_dir) = config.schemas.directory_path() {
        let loader = FileSystemLoader::with_config(schema_dir, config.schemas.load_config());
        directory.load_from(&loader)?;
    }

    if let Some(id) = pattern.get("$id").and_then(Value::as_str) {
        directory.add_schema(id, pattern.clone());
    }
    directory.load_current_pattern_as_schema(pattern.clone());

    Ok(directory)
}

/// Produce a placeholder architecture for `pattern`.
///
/// Only a missing or unreadable schema directory is an error; everything
/// else degrades inline and is reported to `diagnostics`.
pub fn generate_architecture(pattern: &Value, config: &EngineConfig, diagnostics: &Diagnostics) -> Result<Value> {
    let directory = prepare_directory(pattern, config, diagnostics)?;

    let architecture = Instantiator::new(&directory, diagnostics.clone())
        .instantiate_all(config.generate.instantiate_all)
        .instantiate_architecture(pattern);

    tracing::info!(
        schemas = directory.len(),
        diagnostics = diagnostics.len(),
        "Generated architecture from pattern"
    );

    Ok(architecture)
}
