//! Named transform plugins invoked from change specifications.
//!
//! A change-specification mapping that carries [`PLUGIN_KEY`] is a plugin
//! call: the engine looks the named transform up in a [`PluginRegistry`]
//! and hands it the source document, the target mapping, the call's
//! parameters and the target key.
//!
//! Each plugin declares an identifier; it is registered under that
//! identifier with [`IDENTIFIER_PREFIX`] stripped (`fn_replace` →
//! `replace`). Registering a name twice replaces the earlier entry: the
//! last registration wins.
pub mod delete;
pub mod foreach;
pub mod preset;
pub mod replace;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::document::{Document, Mapping, NodeKind};
use crate::error::{ChangeSpecError, ConfigError};
use crate::path::Path;

/// Reserved change-specification key naming the plugin to invoke.
pub const PLUGIN_KEY: &str = "__function";

/// Prefix stripped from plugin identifiers to form their registered name.
pub const IDENTIFIER_PREFIX: &str = "fn_";

/// Registered name for a plugin identifier.
///
/// # Examples
///
/// ```
/// use invsync_cli::transforms::registered_name;
///
/// assert_eq!(registered_name("fn_replace"), "replace");
/// assert_eq!(registered_name("fn_fn_twice"), "fn_twice");
/// assert_eq!(registered_name("custom"), "custom");
/// ```
#[must_use]
pub fn registered_name(identifier: &str) -> &str {
    identifier
        .strip_prefix(IDENTIFIER_PREFIX)
        .unwrap_or(identifier)
}

/// Parameters of one plugin call, tagged with the name it was invoked by.
///
/// The mapping is the change-specification node itself, including
/// [`PLUGIN_KEY`].
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    plugin: &'a str,
    values: &'a Mapping,
}

impl<'a> Params<'a> {
    /// Wrap the parameters of a call to `plugin`.
    #[must_use]
    pub const fn new(plugin: &'a str, values: &'a Mapping) -> Self {
        Self { plugin, values }
    }

    /// Name the plugin was invoked by.
    #[must_use]
    pub const fn plugin(&self) -> &'a str {
        self.plugin
    }

    /// The raw parameter mapping.
    #[must_use]
    pub const fn values(&self) -> &'a Mapping {
        self.values
    }

    /// Look up an optional parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Document> {
        self.values.get(name)
    }

    /// Look up a required parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSpecError::MissingRequiredParam`] if it is absent.
    pub fn required(&self, name: &str) -> Result<&'a Document, ChangeSpecError> {
        self.get(name)
            .ok_or_else(|| ChangeSpecError::MissingRequiredParam {
                plugin: self.plugin.to_string(),
                param: name.to_string(),
            })
    }

    /// Look up a required string parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a string.
    pub fn required_str(&self, name: &str) -> Result<&'a str, ChangeSpecError> {
        let value = self.required(name)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(name, format!("expected a string, found a {}", NodeKind::of(value))))
    }

    /// Look up a required dotted-path parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a string.
    pub fn required_path(&self, name: &str) -> Result<Path, ChangeSpecError> {
        self.required_str(name).map(Path::parse)
    }

    /// Look up a required mapping parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a mapping.
    pub fn required_mapping(&self, name: &str) -> Result<&'a Mapping, ChangeSpecError> {
        let value = self.required(name)?;
        value
            .as_object()
            .ok_or_else(|| self.invalid(name, format!("expected a mapping, found a {}", NodeKind::of(value))))
    }

    /// Look up an optional non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is present but not a non-negative
    /// integer.
    pub fn optional_usize(&self, name: &str) -> Result<Option<usize>, ChangeSpecError> {
        self.get(name)
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| self.invalid(name, "expected a non-negative integer"))
            })
            .transpose()
    }

    /// Build an [`ChangeSpecError::InvalidParam`] for this call.
    #[must_use]
    pub fn invalid(&self, name: &str, reason: impl Into<String>) -> ChangeSpecError {
        ChangeSpecError::InvalidParam {
            plugin: self.plugin.to_string(),
            param: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// A named transform invoked by the engine for plugin-call nodes.
///
/// Implementations write their result into `target` under `key`. They may
/// leave `target` partially modified when they fail; the engine records the
/// failure and moves on to the next key.
pub trait Transform: Send + Sync {
    /// Declared identifier; the registered name is derived from it with
    /// [`registered_name`].
    fn identifier(&self) -> &str;

    /// Apply the transform.
    ///
    /// # Errors
    ///
    /// Returns an error for missing or invalid parameters and for source
    /// lookups that do not resolve.
    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError>;
}

type TransformFn =
    dyn Fn(&Document, &mut Mapping, &Params<'_>, &str) -> Result<(), ChangeSpecError> + Send + Sync;

/// A [`Transform`] backed by a closure.
pub struct FnTransform {
    identifier: String,
    func: Box<TransformFn>,
}

impl FnTransform {
    /// Wrap `func` under `identifier`.
    pub fn new<F>(identifier: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Document, &mut Mapping, &Params<'_>, &str) -> Result<(), ChangeSpecError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            identifier: identifier.into(),
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

impl Transform for FnTransform {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn apply(
        &self,
        source: &Document,
        target: &mut Mapping,
        params: &Params<'_>,
        key: &str,
    ) -> Result<(), ChangeSpecError> {
        (self.func)(source, target, params, key)
    }
}

/// The built-in transforms registered by [`PluginRegistry::with_builtins`].
#[must_use]
pub fn builtin_transforms() -> Vec<Arc<dyn Transform>> {
    vec![
        Arc::new(replace::Replace),
        Arc::new(delete::Delete),
        Arc::new(foreach::ForeachCreateDict),
        Arc::new(foreach::ForeachAugmentDict),
    ]
}

/// Name-keyed table of transforms.
///
/// Populate it at startup, then [`freeze`](Self::freeze) it before running
/// transformations concurrently: the frozen table is shared read-only.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    entries: BTreeMap<String, Arc<dyn Transform>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in transforms.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for transform in builtin_transforms() {
            registry.register(transform);
        }
        registry
    }

    /// Register `transform` under its derived name, returning the entry it
    /// displaced, if any.
    pub fn register(&mut self, transform: Arc<dyn Transform>) -> Option<Arc<dyn Transform>> {
        let name = registered_name(transform.identifier()).to_string();
        tracing::debug!("registering transform '{name}'");
        let previous = self.entries.insert(name.clone(), transform);
        if previous.is_some() {
            tracing::debug!("transform '{name}' replaced an earlier registration");
        }
        previous
    }

    /// Register a closure under `identifier`.
    pub fn register_fn<F>(&mut self, identifier: &str, func: F) -> Option<Arc<dyn Transform>>
    where
        F: Fn(&Document, &mut Mapping, &Params<'_>, &str) -> Result<(), ChangeSpecError>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnTransform::new(identifier, func)))
    }

    /// Register a preset named `name` that forwards to the already
    /// registered `base` with `defaults` merged under the call's params.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPreset`] if `base` is not registered or
    /// the defaults try to set [`PLUGIN_KEY`].
    pub fn register_preset(
        &mut self,
        name: &str,
        base: &str,
        defaults: Mapping,
    ) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidPreset {
            name: name.to_string(),
            reason,
        };
        if defaults.contains_key(PLUGIN_KEY) {
            return Err(invalid(format!("defaults must not set '{PLUGIN_KEY}'")));
        }
        let base_transform = self
            .entries
            .get(base)
            .cloned()
            .ok_or_else(|| invalid(format!("base transform '{base}' is not registered")))?;
        self.register(Arc::new(preset::Preset::new(name, base_transform, defaults)));
        Ok(())
    }

    /// Look up a transform by registered name.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSpecError::UnknownPlugin`] if nothing is registered
    /// under `name`.
    pub fn lookup(&self, name: &str) -> Result<&dyn Transform, ChangeSpecError> {
        self.entries
            .get(name)
            .map(|transform| &**transform)
            .ok_or_else(|| ChangeSpecError::UnknownPlugin(name.to_string()))
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of registered transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the registry into a shared, read-only table.
    #[must_use]
    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.names())
            .finish()
    }
}
