//! Dotted-path addressing into nested documents.
//!
//! A [`Path`] is an ordered list of [`Segment`]s. Its textual form is
//! dot-separated (`interfaces.eth0.mac_address`, `power_ports.0.name`) with
//! no escaping, so a key that itself contains `.` cannot be addressed.
//!
//! Segments are interpreted against the node they index: a numeric segment
//! is a sequence index when the node is a sequence and a literal key when
//! the node is a mapping. Reaching a null node before the path is exhausted
//! short-circuits and yields that null instead of failing, because partial
//! paths over optional inventory data are expected.
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::document::{Document, NodeKind};
use crate::error::PathError;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A mapping key (or a numeric string tried as a sequence index).
    Key(String),
    /// A sequence index (or a mapping key when indexing a mapping).
    Index(usize),
}

impl Segment {
    /// Interpret the segment as a sequence index.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(k) => k.parse().ok(),
        }
    }

    /// Interpret the segment as a mapping key.
    #[must_use]
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Key(k) => Cow::Borrowed(k),
            Self::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// An ordered list of segments addressing a location inside a document.
///
/// The empty path addresses the document root.
///
/// # Examples
///
/// ```
/// use invsync_cli::path::{Path, Segment};
///
/// let p = Path::parse("a.1.c");
/// assert_eq!(p.segments().len(), 3);
/// assert_eq!(p.to_string(), "a.1.c");
/// assert_eq!(Path::from(vec![Segment::from("a"), Segment::from(1_usize)]).to_string(), "a.1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// Split a dotted string into key segments.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::default();
        }
        Self(dotted.split('.').map(Segment::from).collect())
    }

    /// The segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Whether this path addresses the document root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a new path with `other` appended.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Return a new path with one segment appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Resolve this path against `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] naming the first segment that cannot be
    /// resolved.
    pub fn resolve<'a>(&self, doc: &'a Document) -> Result<&'a Document, PathError> {
        resolve(doc, &self.0)
    }

    /// Resolve this path against `doc`, returning a mutable reference.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] naming the first segment that cannot be
    /// resolved.
    pub fn resolve_mut<'a>(&self, doc: &'a mut Document) -> Result<&'a mut Document, PathError> {
        resolve_mut(doc, &self.0)
    }

    /// Write `value` at this path.
    ///
    /// The parent must already exist. Missing mapping keys are created;
    /// sequences are never extended. The empty path replaces the root.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the parent cannot be resolved, if the
    /// parent is a scalar or null, or if a sequence index is past the end.
    pub fn assign(&self, doc: &mut Document, value: Document) -> Result<(), PathError> {
        let Some((last, parent)) = self.0.split_last() else {
            *doc = value;
            return Ok(());
        };
        let position = parent.len();
        match resolve_mut(doc, parent)? {
            Document::Object(map) => {
                map.insert(last.as_key().into_owned(), value);
                Ok(())
            }
            Document::Array(items) => {
                let index = last.as_index().ok_or_else(|| PathError::InvalidIndex {
                    position,
                    segment: last.to_string(),
                })?;
                let len = items.len();
                let slot = items.get_mut(index).ok_or(PathError::IndexOutOfRange {
                    position,
                    index,
                    len,
                })?;
                *slot = value;
                Ok(())
            }
            other => Err(PathError::NotIndexable {
                position,
                segment: last.to_string(),
                kind: NodeKind::of(other).to_string(),
            }),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Path {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<&String> for Path {
    fn from(dotted: &String) -> Self {
        Self::parse(dotted)
    }
}

impl From<String> for Path {
    fn from(dotted: String) -> Self {
        Self::parse(&dotted)
    }
}

impl From<usize> for Path {
    fn from(index: usize) -> Self {
        Self(vec![Segment::Index(index)])
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.into_iter().map(Segment::from).collect())
    }
}

/// Look up the value at `path` in `doc`.
///
/// # Errors
///
/// Returns [`PathError`] when a key is missing, an index is out of range or
/// not numeric, or a scalar is indexed.
///
/// # Examples
///
/// ```
/// use invsync_cli::path::get;
/// use serde_json::json;
///
/// let doc = json!({"list": [{"name": "element1"}, {"name": "element2"}]});
/// assert_eq!(get(&doc, "list.1.name").unwrap(), "element2");
/// assert_eq!(get(&json!([10, 20, 30]), 0_usize).unwrap(), 10);
/// ```
pub fn get(doc: &Document, path: impl Into<Path>) -> Result<&Document, PathError> {
    path.into().resolve(doc)
}

/// Mutable variant of [`get`].
///
/// # Errors
///
/// See [`get`].
pub fn get_mut(doc: &mut Document, path: impl Into<Path>) -> Result<&mut Document, PathError> {
    path.into().resolve_mut(doc)
}

/// Write `value` at `path` in `doc`. See [`Path::assign`].
///
/// # Errors
///
/// See [`Path::assign`].
pub fn set(doc: &mut Document, path: impl Into<Path>, value: Document) -> Result<(), PathError> {
    path.into().assign(doc, value)
}

fn resolve<'a>(doc: &'a Document, segments: &[Segment]) -> Result<&'a Document, PathError> {
    let mut node = doc;
    for (position, segment) in segments.iter().enumerate() {
        node = match node {
            Document::Array(items) => {
                let index = segment.as_index().ok_or_else(|| PathError::InvalidIndex {
                    position,
                    segment: segment.to_string(),
                })?;
                items.get(index).ok_or(PathError::IndexOutOfRange {
                    position,
                    index,
                    len: items.len(),
                })?
            }
            Document::Object(map) => {
                let key = segment.as_key();
                map.get(key.as_ref()).ok_or_else(|| PathError::KeyNotFound {
                    position,
                    key: key.into_owned(),
                })?
            }
            Document::Null => return Ok(node),
            scalar => {
                return Err(PathError::NotIndexable {
                    position,
                    segment: segment.to_string(),
                    kind: NodeKind::of(scalar).to_string(),
                });
            }
        };
    }
    Ok(node)
}

fn resolve_mut<'a>(
    doc: &'a mut Document,
    segments: &[Segment],
) -> Result<&'a mut Document, PathError> {
    let mut node = doc;
    for (position, segment) in segments.iter().enumerate() {
        node = match node {
            Document::Array(items) => {
                let index = segment.as_index().ok_or_else(|| PathError::InvalidIndex {
                    position,
                    segment: segment.to_string(),
                })?;
                let len = items.len();
                items.get_mut(index).ok_or(PathError::IndexOutOfRange {
                    position,
                    index,
                    len,
                })?
            }
            Document::Object(map) => {
                let key = segment.as_key();
                map.get_mut(key.as_ref())
                    .ok_or_else(|| PathError::KeyNotFound {
                        position,
                        key: key.into_owned(),
                    })?
            }
            null @ Document::Null => return Ok(null),
            scalar => {
                return Err(PathError::NotIndexable {
                    position,
                    segment: segment.to_string(),
                    kind: NodeKind::of(scalar).to_string(),
                });
            }
        };
    }
    Ok(node)
}
