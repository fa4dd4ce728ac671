//! Dot-notation tokenizer and parser
//!
//! Grammar, informally:
//!
//! ```text
//! path     := ["$" ["."]] step ("." field | bracket)*
//! step     := field bracket* | bracket+
//! field    := any chars except '.', '[', ']'
//! bracket  := "[" ( quoted | index | "*" | name "==" value | bare ) "]"
//! ```
//!
//! A quoted bracket directly after a field is an id lookup on that
//! collection, or a map-key lookup for the collections in
//! [`MAP_KEYED_COLLECTIONS`].

use super::ast::{PathSegment, MAP_KEYED_COLLECTIONS};
use crate::error::{PatternError, Result};

/// Contents of one `[...]`
#[derive(Debug, PartialEq)]
enum Bracket {
    Quoted(String),
    Bare(String),
    Index(usize),
    Wildcard,
    Filter { field: String, value: String },
}

pub(crate) fn parse_segments(path: &str) -> Result<Vec<PathSegment>> {
    let body = strip_root(path.trim());
    if body.is_empty() {
        return Err(PatternError::invalid_path(path, "empty path"));
    }

    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut expect_field = chars[0] != '[';

    while pos < chars.len() {
        if expect_field {
            let start = pos;
            while pos < chars.len() && !matches!(chars[pos], '.' | '[' | ']') {
                pos += 1;
            }
            if pos == start {
                return Err(PatternError::invalid_path(path, format!("expected a field name at {}", pos)));
            }
            segments.push(PathSegment::Field(chars[start..pos].iter().collect()));
            expect_field = false;
            continue;
        }

        match chars[pos] {
            '.' => {
                pos += 1;
                if pos == chars.len() {
                    return Err(PatternError::invalid_path(path, "trailing '.'"));
                }
                expect_field = true;
            }
            '[' => {
                let (content, next) = read_bracket(&chars, pos + 1)
                    .ok_or_else(|| PatternError::invalid_path(path, "unterminated '['"))?;
                let bracket = classify_bracket(&content)
                    .map_err(|message| PatternError::invalid_path(path, message))?;
                push_bracket(&mut segments, bracket);
                pos = next;
            }
            other => {
                return Err(PatternError::invalid_path(
                    path,
                    format!("unexpected '{}' at {}", other, pos),
                ));
            }
        }
    }

    Ok(segments)
}

/// Drop a leading `$` or `$.` document-root marker
fn strip_root(path: &str) -> &str {
    match path.strip_prefix('$') {
        Some(rest) => rest.strip_prefix('.').unwrap_or(rest),
        None => path,
    }
}

/// Read up to the `]` closing a bracket opened just before `start`.
///
/// Returns the raw contents and the index after `]`.
fn read_bracket(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut quote: Option<char> = None;

    for (i, &c) in chars.iter().enumerate().skip(start) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ']' => return Some((chars[start..i].iter().collect(), i + 1)),
            None if c == '[' => return None,
            None => {}
        }
    }

    None
}

fn classify_bracket(content: &str) -> std::result::Result<Bracket, String> {
    let content = content.trim();
    if content.is_empty() {
        return Err("empty brackets".to_string());
    }

    if let Some(op) = find_equality(content) {
        let field = unquote(content[..op].trim().trim_start_matches("@."))?;
        let value = unquote(content[op + 2..].trim())?;
        if field.is_empty() {
            return Err(format!("filter '{}' has no field", content));
        }
        return Ok(Bracket::Filter { field, value });
    }

    if content == "*" {
        return Ok(Bracket::Wildcard);
    }

    if content.starts_with('\'') || content.starts_with('"') {
        return Ok(Bracket::Quoted(unquote(content)?));
    }

    if content.chars().all(|c| c.is_ascii_digit()) {
        return content
            .parse()
            .map(Bracket::Index)
            .map_err(|e| format!("bad index '{}': {}", content, e));
    }

    Ok(Bracket::Bare(content.to_string()))
}

/// Byte offset of a `==` outside quotes
fn find_equality(content: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev_eq = false;

    for (i, c) in content.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '=' && prev_eq => return Some(i - 1),
            None => {}
        }
        prev_eq = quote.is_none() && c == '=';
    }

    None
}

/// Strip matching single or double quotes; unquoted text is returned as is
fn unquote(text: &str) -> std::result::Result<String, String> {
    let mut chars = text.chars();
    match chars.next() {
        Some(q @ ('\'' | '"')) => {
            if text.len() >= 2 && text.ends_with(q) {
                Ok(text[1..text.len() - 1].to_string())
            } else {
                Err(format!("unterminated quote in '{}'", text))
            }
        }
        _ => Ok(text.to_string()),
    }
}

fn push_bracket(segments: &mut Vec<PathSegment>, bracket: Bracket) {
    let segment = match bracket {
        Bracket::Quoted(name) => match segments.pop() {
            Some(PathSegment::Field(collection)) => {
                if MAP_KEYED_COLLECTIONS.contains(&collection.as_str()) {
                    PathSegment::MapKeyLookup { collection, key: name }
                } else {
                    PathSegment::IdLookup { collection, id: name }
                }
            }
            Some(previous) => {
                segments.push(previous);
                PathSegment::Key(name)
            }
            None => PathSegment::Key(name),
        },
        Bracket::Bare(name) => PathSegment::Key(name),
        Bracket::Index(index) => PathSegment::Index(index),
        Bracket::Wildcard => PathSegment::Wildcard,
        Bracket::Filter { field, value } => PathSegment::IndexFilter { field, value },
    };
    segments.push(segment);
}
