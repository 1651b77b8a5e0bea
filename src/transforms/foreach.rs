//! Build a keyed mapping of records from a source sequence.
//!
//! Both variants clear the target key and then fill it. The augmenting
//! variant does not merge into an existing mapping despite its name.
use super::{Params, Transform};
use crate::document::{Document, Mapping, NodeKind};
use crate::error::ChangeSpecError;
use crate::path::Path;

/// Creates `{key: record}` entries at the target key, one per element of
/// the source sequence at `array`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeachCreateDict;

/// Same observable behavior as [`ForeachCreateDict`]: the target key is
/// reset before it is filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeachAugmentDict;

impl Transform for ForeachCreateDict {
    fn identifier(&self) -> &str {
        "fn_foreach_create_dict"
    }

    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        let records = collect_records(source, params)?;
        target.insert(key.to_string(), Document::Object(records));
        Ok(())
    }
}

impl Transform for ForeachAugmentDict {
    fn identifier(&self) -> &str {
        "fn_foreach_augment_dict"
    }

    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        let records = collect_records(source, params)?;
        target.insert(key.to_string(), Document::Object(records));
        Ok(())
    }
}

/// Parameters: `array` (path to a sequence), `keyname` (path within each
/// element), `structure` (mapping of destination key to a path relative to
/// the element).
fn collect_records(source: &Document, params: &Params<'_>) -> Result<Mapping, ChangeSpecError> {
    let array_path = params.required_path("array")?;
    let keyname = params.required_path("keyname")?;
    let structure = structure_paths(params)?;

    let elements = match array_path.resolve(source)? {
        Document::Array(elements) => elements,
        other => {
            return Err(params.invalid(
                "array",
                format!("'{array_path}' is a {}, not a sequence", NodeKind::of(other)),
            ));
        }
    };

    let mut records = Mapping::new();
    for (index, element) in elements.iter().enumerate() {
        let Some(record_key) = element_key(element, &keyname) else {
            tracing::debug!("{}: element {index} has no usable '{keyname}', skipped", params.plugin());
            continue;
        };

        let element_path = array_path.child(index);
        let mut record = Mapping::new();
        for (dest, relative) in &structure {
            let field_path = element_path.join(relative);
            match field_path.resolve(source) {
                Ok(value) => {
                    record.insert(dest.clone(), value.clone());
                }
                Err(e) => tracing::debug!("{}: '{field_path}' omitted: {e}", params.plugin()),
            }
        }
        records.insert(record_key, Document::Object(record));
    }
    Ok(records)
}

fn structure_paths(params: &Params<'_>) -> Result<Vec<(String, Path)>, ChangeSpecError> {
    params
        .required_mapping("structure")?
        .iter()
        .map(|(dest, relative)| {
            relative
                .as_str()
                .map(|r| (dest.clone(), Path::parse(r)))
                .ok_or_else(|| {
                    params.invalid(
                        "structure",
                        format!("entry '{dest}' is a {}, not a path", NodeKind::of(relative)),
                    )
                })
        })
        .collect()
}

fn element_key(element: &Document, keyname: &Path) -> Option<String> {
    match keyname.resolve(element).ok()? {
        Document::String(s) => Some(s.clone()),
        Document::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
