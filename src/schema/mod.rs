//! Schema registry and `$ref` resolution
//!
//! Pattern files are JSON-Schema documents that reference each other with
//! `$ref`. This module loads them, keys them by `$id`, and resolves
//! references into fully expanded definitions.

pub mod directory;
pub mod loader;
pub mod merge;
pub mod reference;

pub use directory::{missing_definition, ResolutionTrail, SchemaDirectory};
pub use loader::{DocumentLoader, FileSystemLoader, LoadConfig, SchemaDocument};
pub use merge::{merge_definitions, merge_into};
pub use reference::{qualify_local_references, SchemaReference, CURRENT_PATTERN_ID};
