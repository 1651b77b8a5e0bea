//! Parsed change specifications.
use crate::document::{Document, Mapping, NodeKind};
use crate::error::ChangeSpecError;
use crate::path::Path;
use crate::transforms::PLUGIN_KEY;

/// One entry of a change specification.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode {
    /// Copy the source value at this path to the target key.
    Literal(Path),
    /// Invoke a registered transform with the node mapping as parameters.
    PluginCall {
        /// Registered transform name.
        name: String,
        /// The node mapping, including the plugin key.
        params: Mapping,
    },
    /// Recurse into the target mapping at this key.
    SubSpec(ChangeSpec),
}

/// A change specification: ordered target keys and what to do with each.
///
/// # Examples
///
/// ```
/// use invsync_cli::engine::{ChangeSpec, SpecNode};
/// use serde_json::json;
///
/// let spec = ChangeSpec::parse(&json!({
///     "hostname": "name",
///     "short": {"__function": "replace", "value": "name", "search": "x", "replacement": ""},
///     "site": {"slug": "site.slug"}
/// }))
/// .unwrap();
///
/// assert_eq!(spec.len(), 3);
/// assert!(matches!(spec.entries()[0].1, SpecNode::Literal(_)));
/// assert_eq!(spec.plugin_names(), ["replace"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSpec {
    entries: Vec<(String, SpecNode)>,
}

impl ChangeSpec {
    /// Parse a change specification document. The root must be a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSpecError::UnsupportedNodeType`] for any node that is
    /// neither a path string nor a mapping, and for a plugin key whose value
    /// is not a string.
    pub fn parse(value: &Document) -> Result<Self, ChangeSpecError> {
        match value {
            Document::Object(map) => Self::parse_mapping(map, &Path::default()),
            other => Err(unsupported(&Path::default(), other)),
        }
    }

    fn parse_mapping(map: &Mapping, location: &Path) -> Result<Self, ChangeSpecError> {
        let entries = map
            .iter()
            .map(|(key, value)| {
                let here = location.child(key.as_str());
                let node = match value {
                    Document::String(path) => SpecNode::Literal(Path::parse(path)),
                    Document::Object(inner) => match inner.get(PLUGIN_KEY) {
                        Some(Document::String(name)) => SpecNode::PluginCall {
                            name: name.clone(),
                            params: inner.clone(),
                        },
                        Some(other) => return Err(unsupported(&here.child(PLUGIN_KEY), other)),
                        None => SpecNode::SubSpec(Self::parse_mapping(inner, &here)?),
                    },
                    other => return Err(unsupported(&here, other)),
                };
                Ok((key.clone(), node))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    /// Entries in document order.
    #[must_use]
    pub fn entries(&self) -> &[(String, SpecNode)] {
        &self.entries
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every plugin name invoked anywhere in the specification, in document
    /// order (duplicates included).
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_plugin_names(&mut names);
        names
    }

    fn collect_plugin_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        for (_, node) in &self.entries {
            match node {
                SpecNode::PluginCall { name, .. } => names.push(name),
                SpecNode::SubSpec(sub) => sub.collect_plugin_names(names),
                SpecNode::Literal(_) => {}
            }
        }
    }
}

fn unsupported(location: &Path, value: &Document) -> ChangeSpecError {
    ChangeSpecError::UnsupportedNodeType {
        location: location.to_string(),
        kind: NodeKind::of(value).to_string(),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_document_order() {
        let spec = ChangeSpec::parse(&json!({"z": "a", "a": "b", "m": "c"})).unwrap();
        let keys: Vec<&str> = spec.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn literal_paths_are_parsed() {
        let spec = ChangeSpec::parse(&json!({"ip": "interfaces.0.address"})).unwrap();
        assert_eq!(
            spec.entries()[0].1,
            SpecNode::Literal(Path::parse("interfaces.0.address"))
        );
    }

    #[test]
    fn plugin_call_keeps_whole_mapping() {
        let spec = ChangeSpec::parse(&json!({"gone": {"__function": "delete"}})).unwrap();
        let SpecNode::PluginCall { name, params } = &spec.entries()[0].1 else {
            panic!("expected a plugin call");
        };
        assert_eq!(name, "delete");
        assert_eq!(params["__function"], "delete");
    }

    #[test]
    fn nested_plugin_names_are_collected() {
        let spec = ChangeSpec::parse(&json!({
            "a": {"__function": "replace"},
            "b": {"c": {"__function": "delete"}, "d": "x"},
            "e": {"__function": "replace"}
        }))
        .unwrap();
        assert_eq!(spec.plugin_names(), ["replace", "delete", "replace"]);
    }

    #[test]
    fn sequence_node_is_rejected_with_location() {
        let err = ChangeSpec::parse(&json!({"a": {"b": [1, 2]}})).unwrap_err();
        assert_eq!(
            err,
            ChangeSpecError::UnsupportedNodeType {
                location: "a.b".to_string(),
                kind: "sequence".to_string(),
            }
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn scalar_and_null_nodes_are_rejected() {
        assert!(ChangeSpec::parse(&json!({"a": 1})).is_err());
        assert!(ChangeSpec::parse(&json!({"a": true})).is_err());
        assert!(ChangeSpec::parse(&json!({"a": null})).is_err());
    }

    #[test]
    fn non_string_plugin_key_is_rejected() {
        let err = ChangeSpec::parse(&json!({"a": {"__function": 3}})).unwrap_err();
        assert!(err.to_string().contains("a.__function"));
    }

    #[test]
    fn root_must_be_mapping() {
        assert!(ChangeSpec::parse(&json!(["a"])).is_err());
    }

    #[test]
    fn empty_spec() {
        let spec = ChangeSpec::parse(&json!({})).unwrap();
        assert!(spec.is_empty());
        assert!(spec.plugin_names().is_empty());
    }
}
