//! CALM Pattern Engine
//!
//! The core behind the `generate` and `template`/`docify` flows of the CALM
//! architecture-as-code tooling.
//!
//! ## Features
//!
//! - **Schema Resolution**: cross-file and local `$ref`s, schema merging,
//!   circular-reference termination, local-reference qualification
//! - **Instantiation**: placeholder architecture documents from pattern
//!   definitions (`nodes`, `relationships`, `metadata`)
//! - **Dot-notation Queries**: compact template paths compiled and evaluated
//!   over architecture documents, with filter/sort/limit
//!
//! ## Architecture
//!
//! ```text
//! pattern.json ──► SchemaDirectory ──► Instantiator ──► architecture.json
//!                        ▲
//!   schema dir ──────────┘
//!
//! architecture.json + "nodes['api'].name" ──► PathQueryCompiler ──► value
//! ```
//!
//! Nothing here panics or errors on malformed patterns or paths: dangling
//! references, cycles and bad queries degrade to placeholders or `[]` and are
//! recorded in a [`Diagnostics`] handle passed to each component.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod instantiate;
pub mod logging;
pub mod query;
pub mod schema;

pub use config::EngineConfig;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use error::{PatternError, Result};
pub use generate::generate_architecture;
pub use instantiate::Instantiator;
pub use query::{CompiledPath, PathQueryCompiler, PathSegment, QueryOptions, SortKeys};
pub use schema::{qualify_local_references, ResolutionTrail, SchemaDirectory, CURRENT_PATTERN_ID};
