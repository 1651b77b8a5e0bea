//! Nested documents: the value tree shared by inventory records, host files
//! and change specifications.
//!
//! A document is a [`serde_json::Value`] built with insertion-ordered maps.
//! This module names the structural kinds used in error messages and
//! provides structural comparison and file I/O.
pub mod equality;
pub mod io;

use std::fmt;

pub use equality::{equals, equals_excluding};

/// A nested document value.
pub type Document = serde_json::Value;

/// A document mapping node.
pub type Mapping = serde_json::Map<String, Document>;

/// Structural kind of a document node.
///
/// # Examples
///
/// ```
/// use invsync_cli::document::NodeKind;
/// use serde_json::json;
///
/// assert_eq!(NodeKind::of(&json!({"a": 1})), NodeKind::Mapping);
/// assert_eq!(NodeKind::of(&json!([1, 2])), NodeKind::Sequence);
/// assert_eq!(NodeKind::of(&json!("x")), NodeKind::Scalar);
/// assert_eq!(NodeKind::of(&json!(null)), NodeKind::Null);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// String-keyed mapping.
    Mapping,
    /// Ordered sequence.
    Sequence,
    /// String, number or boolean.
    Scalar,
    /// The null / absent sentinel.
    Null,
}

impl NodeKind {
    /// Classify a document node.
    #[must_use]
    pub const fn of(value: &Document) -> Self {
        match value {
            Document::Object(_) => Self::Mapping,
            Document::Array(_) => Self::Sequence,
            Document::Null => Self::Null,
            Document::Bool(_) | Document::Number(_) | Document::String(_) => Self::Scalar,
        }
    }

    /// Lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Scalar => "scalar",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a scalar as the text used for keys and console output.
///
/// Strings are returned without quotes; other values use their JSON form.
#[must_use]
pub fn scalar_text(value: &Document) -> String {
    match value {
        Document::String(s) => s.clone(),
        other => other.to_string(),
    }
}
