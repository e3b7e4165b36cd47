//! Filter Module
//!
//! Predicates applied to reconstructed keys.
//!
//! ## Grammar
//! ```text
//! filters    := constraint ( "," constraint )*
//! constraint := dotpath "=" literal
//! ```
//! Whitespace (including tabs and newlines) around either side is ignored.
//!
//! A filter set is a conjunction evaluated in order; the first miss rejects
//! the key. Prefix filters look at raw key bytes only, field filters at the
//! decoded document, so candidates decode their payload lazily.

mod path;

use std::fmt;

use serde_json::Value;

use crate::error::{Result, RevscopeError};

pub use path::{canonicalize, DotPath};

/// Comparison applied by a field constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
}

impl Operator {
    pub fn apply(self, lhs: &str, rhs: &str) -> bool {
        match self {
            Operator::Equals => lhs == rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equals => f.write_str("="),
        }
    }
}

/// `<lhs> <op> <rhs>` as written by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldConstraint {
    pub lhs: String,
    pub op: Operator,
    pub rhs: String,
}

impl FieldConstraint {
    pub fn new(lhs: impl Into<String>, op: Operator, rhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    /// Validate the path and turn the constraint into a filter
    pub fn build_filter(&self) -> Result<Filter> {
        let path = DotPath::parse(&self.lhs)?;
        Ok(Filter::Field(FieldFilter {
            constraint: self.clone(),
            path,
        }))
    }
}

impl fmt::Display for FieldConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.op, self.rhs)
    }
}

/// A field constraint with its path already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    constraint: FieldConstraint,
    path: DotPath,
}

impl FieldFilter {
    pub fn constraint(&self) -> &FieldConstraint {
        &self.constraint
    }

    pub fn path(&self) -> &DotPath {
        &self.path
    }

    /// Unresolvable paths and null values are non-matches, not errors
    pub fn matches_document(&self, document: &Value) -> bool {
        self.path
            .resolve(document)
            .ok()
            .and_then(canonicalize)
            .map_or(false, |lhs| self.constraint.op.apply(&lhs, &self.constraint.rhs))
    }
}

/// A single predicate over a candidate key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Raw key starts with the given bytes
    Prefix(Vec<u8>),
    /// Decoded document satisfies a field constraint
    Field(FieldFilter),
}

impl Filter {
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Filter::Prefix(prefix.into())
    }

    pub fn field_constraint(&self) -> Option<&FieldConstraint> {
        match self {
            Filter::Prefix(_) => None,
            Filter::Field(field) => Some(field.constraint()),
        }
    }

    /// Whether evaluation needs the decoded payload
    pub fn needs_payload(&self) -> bool {
        matches!(self, Filter::Field(_))
    }

    pub fn matches<S: Subject + ?Sized>(&self, subject: &mut S) -> bool {
        match self {
            Filter::Prefix(prefix) => subject.key().starts_with(prefix),
            Filter::Field(field) => field.matches_document(subject.document()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Prefix(prefix) => write!(f, "prefix({})", String::from_utf8_lossy(prefix)),
            Filter::Field(field) => write!(f, "{}", field.constraint()),
        }
    }
}

/// Something filters can be evaluated against
pub trait Subject {
    fn key(&self) -> &[u8];

    /// Document addressed by field filters, built on first use
    fn document(&mut self) -> &Value;
}

/// A subject with an eagerly supplied document
pub struct StaticSubject<'a> {
    pub key: &'a [u8],
    pub document: Value,
}

impl Subject for StaticSubject<'_> {
    fn key(&self) -> &[u8] {
        self.key
    }

    fn document(&mut self) -> &Value {
        &self.document
    }
}

/// Every filter matches, checked in order; an empty set matches everything
pub fn matches_all<S: Subject + ?Sized>(filters: &[Filter], subject: &mut S) -> bool {
    filters.iter().all(|filter| filter.matches(subject))
}

/// Parse `"<path>=<literal>[,<path>=<literal>]*"` into field filters
pub fn parse_filters(raw: &str) -> Result<Vec<Filter>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|clause| {
            let mut parts = clause.split('=');
            let (lhs, rhs) = match (parts.next(), parts.next(), parts.next()) {
                (Some(lhs), Some(rhs), None) => (lhs.trim(), rhs.trim()),
                _ => {
                    return Err(RevscopeError::InvalidFilterSpec {
                        raw: clause.to_string(),
                        reason: "expected exactly one '='".to_string(),
                    })
                }
            };
            if lhs.is_empty() {
                return Err(RevscopeError::InvalidFilterSpec {
                    raw: clause.to_string(),
                    reason: "missing field path before '='".to_string(),
                });
            }
            FieldConstraint::new(lhs, Operator::Equals, rhs).build_filter()
        })
        .collect()
}
