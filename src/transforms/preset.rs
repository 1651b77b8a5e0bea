//! Config-declared transforms that forward to a base transform with
//! default parameters.
use std::fmt;
use std::sync::Arc;

use super::{Params, Transform};
use crate::document::{Document, Mapping};
use crate::error::ChangeSpecError;

/// A named transform that merges its defaults under the call-site params
/// and forwards to `base`. Call-site params win.
pub struct Preset {
    name: String,
    base: Arc<dyn Transform>,
    defaults: Mapping,
}

impl Preset {
    /// Create a preset named `name`.
    pub fn new(name: impl Into<String>, base: Arc<dyn Transform>, defaults: Mapping) -> Self {
        Self {
            name: name.into(),
            base,
            defaults,
        }
    }

    /// Defaults merged with `params`, call-site values winning.
    fn merged(&self, params: &Mapping) -> Mapping {
        let mut merged = self.defaults.clone();
        for (k, v) in params {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl fmt::Debug for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("base", &self.base.identifier())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Transform for Preset {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        let merged = self.merged(params.values());
        self.base
            .apply(source, target, &Params::new(params.plugin(), &merged), key)
    }
}
