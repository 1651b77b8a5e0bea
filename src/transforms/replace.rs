//! Regular-expression substitution on a source value.
use regex::Regex;

use super::{Params, Transform};
use crate::document::{Document, Mapping, NodeKind};
use crate::error::ChangeSpecError;

/// Resolves `value` in the source, substitutes `search` with `replacement`
/// and writes the result at the target key.
///
/// Parameters: `value` (path), `search` (regex), `replacement` (string,
/// `$1` / `${name}` capture syntax), optional `count` (0 or absent means
/// every match).
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl Transform for Replace {
    fn identifier(&self) -> &str {
        "fn_replace"
    }

    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        let value_path = params.required_path("value")?;
        let search = params.required_str("search")?;
        let replacement = params.required_str("replacement")?;
        let count = params.optional_usize("count")?.unwrap_or(0);

        let regex = Regex::new(search).map_err(|e| params.invalid("search", e.to_string()))?;
        let value = value_path.resolve(source)?;
        let text = value.as_str().ok_or_else(|| {
            params.invalid(
                "value",
                format!("'{value_path}' is a {}, not a string", NodeKind::of(value)),
            )
        })?;

        let replaced = regex.replacen(text, count, replacement);
        target.insert(key.to_string(), Document::String(replaced.into_owned()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::PathError;
    use serde_json::json;

    fn run(source: &Document, params: &Document) -> (Mapping, Result<(), ChangeSpecError>) {
        let values = params.as_object().cloned().unwrap();
        let mut target = Mapping::new();
        let result = Replace.apply(source, &mut target, &Params::new("replace", &values), "out");
        (target, result)
    }

    #[test]
    fn strips_domain_suffix() {
        let source = json!({"name": "host1.example.com"});
        let (target, result) = run(
            &source,
            &json!({"value": "name", "search": "\\.example\\.com$", "replacement": ""}),
        );
        result.unwrap();
        assert_eq!(target["out"], "host1");
    }

    #[test]
    fn count_limits_substitutions() {
        let source = json!({"name": "a-b-c-d"});
        let (target, result) = run(
            &source,
            &json!({"value": "name", "search": "-", "replacement": "_", "count": 2}),
        );
        result.unwrap();
        assert_eq!(target["out"], "a_b_c-d");
    }

    #[test]
    fn count_zero_is_unlimited() {
        let source = json!({"name": "a-b-c"});
        let (target, result) = run(
            &source,
            &json!({"value": "name", "search": "-", "replacement": "", "count": 0}),
        );
        result.unwrap();
        assert_eq!(target["out"], "abc");
    }

    #[test]
    fn capture_groups_expand() {
        let source = json!({"iface": {"name": "Ethernet1/12"}});
        let (target, result) = run(
            &source,
            &json!({
                "value": "iface.name",
                "search": "^Ethernet(\\d+)/(\\d+)$",
                "replacement": "eth${1}_$2"
            }),
        );
        result.unwrap();
        assert_eq!(target["out"], "eth1_12");
    }

    #[test]
    fn missing_params_are_reported_by_name() {
        let source = json!({"name": "x"});
        for (params, missing) in [
            (json!({"search": "x", "replacement": ""}), "value"),
            (json!({"value": "name", "replacement": ""}), "search"),
            (json!({"value": "name", "search": "x"}), "replacement"),
        ] {
            let (target, result) = run(&source, &params);
            assert_eq!(
                result.unwrap_err(),
                ChangeSpecError::MissingRequiredParam {
                    plugin: "replace".to_string(),
                    param: missing.to_string(),
                }
            );
            assert!(target.is_empty());
        }
    }

    #[test]
    fn unresolvable_source_is_path_error() {
        let (target, result) = run(
            &json!({}),
            &json!({"value": "name", "search": "x", "replacement": ""}),
        );
        assert_eq!(
            result.unwrap_err(),
            ChangeSpecError::Path(PathError::KeyNotFound {
                position: 0,
                key: "name".to_string(),
            })
        );
        assert!(target.is_empty());
    }

    #[test]
    fn non_string_value_is_invalid() {
        let (_, result) = run(
            &json!({"id": 7}),
            &json!({"value": "id", "search": "7", "replacement": "8"}),
        );
        assert!(matches!(
            result,
            Err(ChangeSpecError::InvalidParam { ref param, .. }) if param == "value"
        ));
    }

    #[test]
    fn bad_regex_is_invalid() {
        let (_, result) = run(
            &json!({"name": "x"}),
            &json!({"value": "name", "search": "(", "replacement": ""}),
        );
        assert!(matches!(
            result,
            Err(ChangeSpecError::InvalidParam { ref param, .. }) if param == "search"
        ));
    }
}
