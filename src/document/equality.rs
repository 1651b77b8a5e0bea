//! Deep structural comparison of documents.
//!
//! Mappings compare as key sets (order irrelevant), sequences positionally,
//! numbers by numeric value. Nodes of different structural kinds never
//! compare equal.
use super::{Document, Mapping, NodeKind};

/// Compare two documents structurally.
///
/// # Examples
///
/// ```
/// use invsync_cli::document::equals;
/// use serde_json::json;
///
/// assert!(equals(&json!({"x": 1, "y": 2}), &json!({"y": 2, "x": 1})));
/// assert!(!equals(&json!([1, 2]), &json!([2, 1])));
/// ```
#[must_use]
pub fn equals(left: &Document, right: &Document) -> bool {
    equals_excluding(left, right, &[])
}

/// Compare two documents structurally, ignoring `excluded` keys in every
/// mapping at any depth.
#[must_use]
pub fn equals_excluding(left: &Document, right: &Document, excluded: &[&str]) -> bool {
    if NodeKind::of(left) != NodeKind::of(right) {
        return false;
    }
    match (left, right) {
        (Document::Object(l), Document::Object(r)) => mappings_equal(l, r, excluded),
        (Document::Array(l), Document::Array(r)) => {
            l.len() == r.len()
                && l.iter()
                    .zip(r)
                    .all(|(a, b)| equals_excluding(a, b, excluded))
        }
        (Document::Number(l), Document::Number(r)) => numbers_equal(l, r),
        _ => left == right,
    }
}

fn mappings_equal(left: &Mapping, right: &Mapping, excluded: &[&str]) -> bool {
    let kept = |key: &str| !excluded.contains(&key);

    let left_matches = left
        .iter()
        .filter(|(k, _)| kept(k.as_str()))
        .all(|(k, v)| {
            right
                .get(k)
                .is_some_and(|other| equals_excluding(v, other, excluded))
        });

    left_matches
        && right
            .keys()
            .filter(|k| kept(k.as_str()))
            .all(|k| left.contains_key(k))
}

fn numbers_equal(left: &serde_json::Number, right: &serde_json::Number) -> bool {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return l == r;
    }
    if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
        return l == r;
    }
    match (left.as_f64(), right.as_f64()) {
        #[allow(clippy::float_cmp)]
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}
