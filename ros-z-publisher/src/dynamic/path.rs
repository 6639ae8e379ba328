//! Field paths addressing nodes inside a message tree.
//!
//! A path is relative to the topic root: `""` is the root, `/pose/position/x`
//! a nested field, `/points[2]/y` a field of an array element.

use std::fmt;

use super::error::DynamicError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Field(&'a str),
    Index(usize),
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "/{}", name),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// Path of a child field.
pub fn child_path(parent: &str, field: &str) -> String {
    format!("{}/{}", parent, field)
}

/// Path of an array element.
pub fn element_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Split a field path into its segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment<'_>>, DynamicError> {
    let invalid = || DynamicError::InvalidPath(path.to_string());
    let mut segments = Vec::new();
    let mut rest = path.strip_prefix('/').unwrap_or(path);
    let mut expect_field = !rest.starts_with('[');

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(invalid)?;
            let index = after[..close].parse::<usize>().map_err(|_| invalid())?;
            segments.push(PathSegment::Index(index));
            rest = &after[close + 1..];
            expect_field = false;
        } else if let Some(after) = rest.strip_prefix('/') {
            if expect_field {
                return Err(invalid());
            }
            rest = after;
            expect_field = true;
        } else {
            if !expect_field {
                return Err(invalid());
            }
            let end = rest.find(['/', '[']).unwrap_or(rest.len());
            let name = &rest[..end];
            if name.is_empty() {
                return Err(invalid());
            }
            segments.push(PathSegment::Field(name));
            rest = &rest[end..];
            expect_field = false;
        }
    }
    if expect_field && !segments.is_empty() {
        // trailing slash
        return Err(invalid());
    }
    Ok(segments)
}

/// Rebuild `path` in the form the filler addresses nodes with.
///
/// The leading `/` is optional on input, so `x`, `/x` and ` /x ` all map to
/// `/x`, and `/` maps to the root `""`.
pub fn canonical_path(path: &str) -> Result<String, DynamicError> {
    let mut canonical = String::new();
    for segment in parse_path(path.trim())? {
        canonical = match segment {
            PathSegment::Field(name) => child_path(&canonical, name),
            PathSegment::Index(index) => element_path(&canonical, index),
        };
    }
    Ok(canonical)
}

/// Whether `path` addresses a node strictly below `ancestor`.
pub fn is_strict_descendant(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.starts_with('/') || rest.starts_with('['),
        None => false,
    }
}
