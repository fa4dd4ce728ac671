//! Schema Loading
//!
//! Discovers schema documents on disk and parses them into JSON values.
//! JSON and YAML are both accepted; YAML is converted to the same
//! `serde_json::Value` tree so resolution never cares where a schema came from.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::{PatternError, Result};

/// Configuration for schema loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// File extensions treated as schema documents
    pub extensions: Vec<String>,
    /// Skip documents whose relative path starts with one of these
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string(), "yaml".to_string(), "yml".to_string()],
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
        }
    }
}

/// A parsed schema document and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub path: PathBuf,
    pub content: Value,
}

impl SchemaDocument {
    pub fn new(path: impl Into<PathBuf>, content: Value) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// The document's `$id`, if it declares one
    pub fn id(&self) -> Option<&str> {
        self.content.get("$id").and_then(Value::as_str)
    }
}

/// Source of already-parsed schema documents
///
/// Implementations decide where documents come from (a directory, an
/// embedded bundle, a remote store). Per-document problems are reported to
/// `diagnostics` and skipped; only failures that leave no usable corpus at
/// all are returned as errors.
pub trait DocumentLoader {
    fn load_documents(&self, diagnostics: &Diagnostics) -> Result<Vec<SchemaDocument>>;
}

/// Loads every schema file below a directory
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
    config: LoadConfig,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, LoadConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: LoadConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn skipped(&self, relative: &Path) -> bool {
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        self.config.skip_prefixes.iter().any(|p| relative_str.starts_with(p.as_str()))
    }
}

impl DocumentLoader for FileSystemLoader {
    fn load_documents(&self, diagnostics: &Diagnostics) -> Result<Vec<SchemaDocument>> {
        if !self.root.is_dir() {
            return Err(PatternError::DirectoryNotFound {
                path: self.root.clone(),
            });
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(PatternError::DirectoryUnreadable {
                        path: self.root.clone(),
                        source: err,
                    });
                }
                Err(err) => {
                    let subject = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    diagnostics.record(subject, DiagnosticCode::UnreadableEntry, err.to_string());
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.accepts(path) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if self.skipped(relative) {
                continue;
            }

            match read_document(path) {
                Ok(content) => documents.push(SchemaDocument::new(path, content)),
                Err(err) => diagnostics.report(
                    DiagnosticItem::new(
                        path.display().to_string(),
                        DiagnosticCode::UnparseableDocument,
                        "Skipping schema file that could not be parsed",
                    )
                    .with_context(err.to_string()),
                ),
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            count = documents.len(),
            "Discovered schema documents"
        );

        Ok(documents)
    }
}

/// Read and parse one schema file, choosing the parser from its extension
pub fn read_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    parse_document(path, &content)
}

/// Parse document text as YAML (`.yaml`/`.yml`) or JSON (anything else)
pub fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}
