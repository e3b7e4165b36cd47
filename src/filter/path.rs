//! Dot paths over decoded documents
//!
//! `.Value.metadata.namespace` walks object members by name; a numeric
//! segment indexes into an array (`.Value.spec.containers.0.image`).

use std::fmt;

use serde_json::Value;

use crate::error::{Result, RevscopeError};

/// A parsed, validated dot path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPath {
    raw: String,
    segments: Vec<String>,
}

impl DotPath {
    /// Parse `raw`; a single leading dot is optional, empty segments are not
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(invalid(raw, "path has no segments"));
        }

        let segments: Vec<String> = body.split('.').map(str::to_string).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid(raw, "path contains an empty segment"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk the path from `root`, failing with `InvalidPath` at the first miss
    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match node {
                Value::Object(members) => members.get(segment.as_str()),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            })
            .ok_or_else(|| RevscopeError::InvalidPath(self.raw.clone()))
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// String form of a resolved value used for comparisons.
///
/// Strings compare by content, scalars and containers by their compact JSON
/// text. `null` has no canonical form.
pub fn canonicalize(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn invalid(raw: &str, reason: &str) -> RevscopeError {
    RevscopeError::InvalidFilterSpec {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}
