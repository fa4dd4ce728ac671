//! Dot-notation Queries
//!
//! Compiles template path expressions such as
//! `nodes['api'].controls['security'].requirements[0].key-rotation-period`
//! and evaluates them over concrete architecture documents.
//!
//! Queries never fail from the caller's point of view: a malformed path or a
//! missing branch yields `[]` and a diagnostic.

pub mod ast;
pub mod options;
mod parser;

pub use ast::{CompiledPath, PathSegment, ID_FIELD, MAP_KEYED_COLLECTIONS};
pub use options::{QueryOptions, SortKeys};

use serde_json::Value;

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::Result;

/// Compiles and evaluates dot-notation paths
#[derive(Debug, Clone)]
pub struct PathQueryCompiler {
    diagnostics: Diagnostics,
}

impl PathQueryCompiler {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Parse `path` without evaluating it
    pub fn compile(&self, path: &str) -> Result<CompiledPath> {
        CompiledPath::parse(path)
    }

    /// Evaluate `path` against `document` and apply `options`.
    ///
    /// A single array result is treated as the collection itself. A path that
    /// ends in brackets always yields an array; otherwise a single remaining
    /// match is returned bare.
    pub fn convert_from_dot_notation(&self, document: &Value, path: &str, options: &QueryOptions) -> Value {
        let path = path.trim();
        if options.is_empty() && is_bare_identifier(path) {
            return document.get(path).cloned().unwrap_or_else(empty_result);
        }

        let compiled = match self.compile(path) {
            Ok(compiled) => compiled,
            Err(err) => {
                self.diagnostics.report(
                    DiagnosticItem::new(path, DiagnosticCode::InvalidQuery, "Path expression could not be compiled")
                        .with_context(err.to_string()),
                );
                return empty_result();
            }
        };

        let results: Vec<Value> = compiled.evaluate(document).into_iter().cloned().collect();
        tracing::debug!(
            path,
            compiled = %compiled,
            matches = results.len(),
            "Evaluated path expression"
        );

        shape_result(&compiled, results, options)
    }
}

fn is_bare_identifier(path: &str) -> bool {
    !path.is_empty() && !path.contains(['.', '[', ']'])
}

fn empty_result() -> Value {
    Value::Array(Vec::new())
}

fn shape_result(compiled: &CompiledPath, results: Vec<Value>, options: &QueryOptions) -> Value {
    let results = match <[Value; 1]>::try_from(results) {
        Ok([Value::Array(inner)]) => return Value::Array(options.apply(inner)),
        Ok([single]) => vec![single],
        Err(results) => results,
    };

    let mut processed = options.apply(results);
    if processed.len() == 1 && !compiled.ends_with_bracket() {
        return processed.remove(0);
    }
    Value::Array(processed)
}
