//! Diagnostics
//!
//! Collects the anomalies the engine recovers from (dangling references,
//! cycles, unparseable schema files, bad query paths) so callers can inspect
//! them after a run. Every reported item is also emitted as a `tracing` event.
//!
//! A [`Diagnostics`] handle is passed into each component at construction.
//! Clones share the same underlying collection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Resolution ===
    /// `$ref` target schema or pointer not found
    UnresolvedRef,
    /// Reference revisited during one resolution
    CircularRef,
    /// Schema id looked up but never registered
    MissingSchema,

    // === Loading ===
    /// Schema document has no `$id`
    MissingId,
    /// Schema file could not be read or parsed
    UnparseableDocument,
    /// Directory entry could not be visited
    UnreadableEntry,

    // === Instantiation ===
    /// Pattern collection uses `items` instead of `prefixItems`
    DeprecatedItems,
    /// Pattern has no definitions for a collection
    MissingCollection,

    // === Query ===
    /// Path expression failed to compile or evaluate
    InvalidQuery,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedRef => "E001",
            Self::CircularRef => "W001",
            Self::MissingSchema => "W002",
            Self::MissingId => "W003",
            Self::UnparseableDocument => "W004",
            Self::UnreadableEntry => "W005",
            Self::DeprecatedItems => "W006",
            Self::MissingCollection => "I001",
            Self::InvalidQuery => "W007",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedRef => Severity::Error,

            Self::CircularRef
            | Self::MissingSchema
            | Self::MissingId
            | Self::UnparseableDocument
            | Self::UnreadableEntry
            | Self::DeprecatedItems
            | Self::InvalidQuery => Severity::Warning,

            Self::MissingCollection => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// What the diagnostic is about (a reference, a file path, a query path)
    pub subject: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context (e.g. the resolution trail, registered schema ids)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Shared, thread-safe collection of diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Arc<Mutex<Vec<DiagnosticItem>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DiagnosticItem>> {
        // A panic while holding the lock cannot leave a Vec half-pushed.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a diagnostic item and emit it as a tracing event
    pub fn report(&self, item: DiagnosticItem) {
        let context = item.context.join("; ");
        match item.severity() {
            Severity::Error => tracing::error!(
                code = %item.code,
                subject = %item.subject,
                context = %context,
                "{}",
                item.message
            ),
            Severity::Warning => tracing::warn!(
                code = %item.code,
                subject = %item.subject,
                context = %context,
                "{}",
                item.message
            ),
            Severity::Info => tracing::info!(
                code = %item.code,
                subject = %item.subject,
                "{}",
                item.message
            ),
        }
        self.lock().push(item);
    }

    /// Record a diagnostic built from its parts
    pub fn record(&self, subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) {
        self.report(DiagnosticItem::new(subject, code, message));
    }

    /// Snapshot of all items reported so far
    pub fn items(&self) -> Vec<DiagnosticItem> {
        self.lock().clone()
    }

    /// Items carrying a given code
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<DiagnosticItem> {
        self.lock().iter().filter(|i| i.code == code).cloned().collect()
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.lock().iter().any(|i| i.code == code)
    }

    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.lock().iter().filter(|i| i.severity() == Severity::Warning).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop everything reported so far
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.lock().iter() {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::UnresolvedRef.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::CircularRef.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::MissingCollection.severity(), Severity::Info);
    }

    #[test]
    fn test_clones_share_collection() {
        let diags = Diagnostics::new();
        let handle = diags.clone();

        handle.record("pattern#/defs/a", DiagnosticCode::CircularRef, "cycle");
        diags.report(
            DiagnosticItem::new("#/x", DiagnosticCode::UnresolvedRef, "missing")
                .with_context("trail: a -> b"),
        );

        assert_eq!(diags.len(), 2);
        assert_eq!(handle.warning_count(), 1);
        assert!(handle.has_errors());
        assert!(diags.has_code(DiagnosticCode::CircularRef));
        assert_eq!(diags.with_code(DiagnosticCode::UnresolvedRef)[0].context.len(), 1);

        handle.clear();
        assert!(diags.is_empty());
    }

    #[test]
    fn test_record_keeps_code_severity() {
        let diags = Diagnostics::new();
        diags.record("relationships", DiagnosticCode::MissingCollection, "Pattern defines no relationships");

        let items = diags.items();
        assert_eq!(items[0].severity(), Severity::Info);
        assert_eq!(diags.warning_count(), 0);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_display_includes_context() {
        let item = DiagnosticItem::new("nodes", DiagnosticCode::DeprecatedItems, "use prefixItems")
            .with_context("path: properties/nodes");
        let text = item.to_string();
        assert!(text.starts_with("[W006] warning: use prefixItems (nodes)"));
        assert!(text.contains("\n  - path: properties/nodes"));
    }
}
