//! Compiled path expressions
//!
//! A dot-notation path compiles to an ordered list of [`PathSegment`]s that
//! is evaluated over a node set, starting from the document root.

use serde_json::Value;
use std::fmt;

use super::parser;
use crate::error::Result;

/// Collections whose `['key']` lookups address map keys, not `unique-id`s
pub const MAP_KEYED_COLLECTIONS: &[&str] = &["controls", "metadata"];

/// Field matched by `collection['id']` lookups
pub const ID_FIELD: &str = "unique-id";

/// One step of a compiled path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name`
    Field(String),
    /// `['name']` or `[name]` not attached to a named collection
    Key(String),
    /// `[0]`
    Index(usize),
    /// `[*]`
    Wildcard,
    /// `[field=='value']`: elements whose `field` equals `value`
    IndexFilter { field: String, value: String },
    /// `collection['id']`: elements of `collection` whose `unique-id` is `id`
    IdLookup { collection: String, id: String },
    /// `controls['key']` / `metadata['key']`: direct key access
    MapKeyLookup { collection: String, key: String },
}

impl PathSegment {
    /// Whether the segment was written in brackets
    pub fn is_bracketed(&self) -> bool {
        !matches!(self, Self::Field(_))
    }
}

/// A parsed path expression, ready to evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    source: String,
    segments: Vec<PathSegment>,
}

impl CompiledPath {
    pub fn parse(path: &str) -> Result<Self> {
        Ok(Self {
            source: path.to_string(),
            segments: parser::parse_segments(path)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True when the path ends in brackets with no field dereferenced after
    pub fn ends_with_bracket(&self) -> bool {
        self.segments.last().map(PathSegment::is_bracketed).unwrap_or(false)
    }

    /// Evaluate against `document`. Missing branches simply produce no nodes.
    pub fn evaluate<'v>(&self, document: &'v Value) -> Vec<&'v Value> {
        self.segments
            .iter()
            .fold(vec![document], |nodes, segment| apply_segment(segment, nodes))
    }
}

fn apply_segment<'v>(segment: &PathSegment, nodes: Vec<&'v Value>) -> Vec<&'v Value> {
    match segment {
        PathSegment::Field(name) | PathSegment::Key(name) => {
            nodes.into_iter().filter_map(|node| node.as_object()?.get(name)).collect()
        }
        PathSegment::Index(index) => {
            nodes.into_iter().filter_map(|node| node.as_array()?.get(*index)).collect()
        }
        PathSegment::Wildcard => nodes.into_iter().flat_map(children).collect(),
        PathSegment::IndexFilter { field, value } => nodes
            .into_iter()
            .flat_map(children)
            .filter(|child| child.get(field.as_str()).map(|v| field_equals(v, value)).unwrap_or(false))
            .collect(),
        PathSegment::IdLookup { collection, id } => nodes
            .into_iter()
            .filter_map(|node| node.as_object()?.get(collection))
            .flat_map(children)
            .filter(|child| child.get(ID_FIELD).map(|v| field_equals(v, id)).unwrap_or(false))
            .collect(),
        PathSegment::MapKeyLookup { collection, key } => nodes
            .into_iter()
            .filter_map(|node| node.as_object()?.get(collection)?.as_object()?.get(key))
            .collect(),
    }
}

/// Elements of an array or values of an object
fn children(node: &Value) -> Vec<&Value> {
    match node {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(obj) => obj.values().collect(),
        _ => Vec::new(),
    }
}

fn field_equals(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_member(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_identifier(name) {
        write!(f, ".{}", name)
    } else {
        write!(f, "['{}']", name)
    }
}

/// Renders the equivalent JSONPath expression
impl fmt::Display for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write_member(f, name)?,
                PathSegment::Key(key) => write!(f, "['{}']", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Wildcard => write!(f, "[*]")?,
                PathSegment::IndexFilter { field, value } => {
                    write!(f, "[?(@['{}']=='{}')]", field, value)?
                }
                PathSegment::IdLookup { collection, id } => {
                    write_member(f, collection)?;
                    write!(f, "[?(@['{}']=='{}')]", ID_FIELD, id)?
                }
                PathSegment::MapKeyLookup { collection, key } => {
                    write_member(f, collection)?;
                    write!(f, "['{}']", key)?
                }
            }
        }
        Ok(())
    }
}
