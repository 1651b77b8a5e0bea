//! Removal of a target key.
use super::{Params, Transform};
use crate::document::{Document, Mapping};
use crate::error::ChangeSpecError;

/// Removes the target key if present. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

impl Transform for Delete {
    fn identifier(&self) -> &str {
        "fn_delete"
    }

    fn apply(
        &self,
        _source: &Document,
        target: &mut Mapping,
        _params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        if target.shift_remove(key).is_some() {
            tracing::debug!("deleted '{key}'");
        }
        Ok(())
    }
}
