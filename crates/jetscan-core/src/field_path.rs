//! Dotted field path parsing.
//!
//! A field path like `location.zone` names a (possibly nested) field inside
//! a structured payload. Paths are parsed once, up front, by a single linear
//! split on `.`; both validation and per-message extraction then walk the
//! segment list iteratively.

use crate::error::{CoreError, Result};

/// An ordered, non-empty list of field name segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path into its segments.
    ///
    /// Rejects empty paths and paths with empty segments (`"a..b"`, `".a"`).
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(CoreError::EmptyFieldPath);
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CoreError::EmptyPathSegment(path.to_string()));
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// The path as originally written, e.g. `location.zone`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The ordered segment names.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The output column name for this path: dots replaced with underscores.
    pub fn column_name(&self) -> String {
        self.raw.replace('.', "_")
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
