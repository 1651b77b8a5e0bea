//! Applies a change specification to a target mapping.
//!
//! For every key of the specification, in order:
//!
//! - a path string copies the source value at that path to the key;
//! - a mapping carrying the plugin key invokes that transform;
//! - any other mapping recurses into the target mapping at the key,
//!   creating it if absent.
//!
//! Per-key failures are recorded in the [`RunReport`] and processing moves
//! on. After a recursion or plugin call, an empty mapping left at the key is
//! removed. Unknown plugin names abort the run before the target is touched.
pub mod report;
pub mod spec;

pub use report::{FailureKind, RecordedFailure, RunReport};
pub use spec::{ChangeSpec, SpecNode};

use crate::document::{Document, Mapping, NodeKind};
use crate::error::ChangeSpecError;
use crate::path::Path;
use crate::transforms::{Params, PluginRegistry};

/// Runs change specifications against a borrowed plugin registry.
#[derive(Debug, Clone, Copy)]
pub struct TransformEngine<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> TransformEngine<'r> {
    /// Create an engine that resolves plugins in `registry`.
    #[must_use]
    pub const fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    /// Verify every plugin the specification invokes is registered.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSpecError::UnknownPlugin`] for the first unregistered
    /// name in document order.
    pub fn check(&self, spec: &ChangeSpec) -> Result<(), ChangeSpecError> {
        for name in spec.plugin_names() {
            self.registry.lookup(name)?;
        }
        Ok(())
    }

    /// Apply `spec` to `target`, reading values from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeSpecError::UnknownPlugin`] without modifying `target`
    /// if the specification names an unregistered plugin. Every other
    /// failure is recorded in the returned report.
    pub fn run(
        &self,
        spec: &ChangeSpec,
        source: &Document,
        target: &mut Mapping,
    ) -> Result<RunReport, ChangeSpecError> {
        self.check(spec)?;
        let mut report = RunReport::default();
        self.walk(spec, source, target, &Path::default(), &mut report)?;
        Ok(report)
    }

    fn walk(
        &self,
        spec: &ChangeSpec,
        source: &Document,
        target: &mut Mapping,
        base: &Path,
        report: &mut RunReport,
    ) -> Result<(), ChangeSpecError> {
        for (key, node) in spec.entries() {
            let location = base.child(key.as_str());
            match node {
                SpecNode::Literal(path) => match path.resolve(source) {
                    Ok(value) => {
                        target.insert(key.clone(), value.clone());
                        report.assigned += 1;
                    }
                    Err(error) => report.record(
                        location,
                        FailureKind::Lookup {
                            source: path.clone(),
                            error,
                        },
                    ),
                },
                SpecNode::PluginCall { name, params } => {
                    let transform = self.registry.lookup(name)?;
                    report.plugin_calls += 1;
                    if let Err(error) =
                        transform.apply(source, target, &Params::new(name, params), key)
                    {
                        report.record(
                            location,
                            FailureKind::Plugin {
                                name: name.clone(),
                                error,
                            },
                        );
                    }
                    prune_empty(target, key, report);
                }
                SpecNode::SubSpec(sub) => {
                    let entry = target
                        .entry(key.clone())
                        .or_insert_with(|| Document::Object(Mapping::new()));
                    match entry {
                        Document::Object(child) => {
                            self.walk(sub, source, child, &location, report)?;
                        }
                        other => {
                            let found = NodeKind::of(other);
                            report.record(location, FailureKind::NotAMapping { found });
                        }
                    }
                    prune_empty(target, key, report);
                }
            }
        }
        Ok(())
    }
}

fn prune_empty(target: &mut Mapping, key: &str, report: &mut RunReport) {
    if target
        .get(key)
        .and_then(Document::as_object)
        .is_some_and(Mapping::is_empty)
    {
        target.shift_remove(key);
        report.pruned += 1;
    }
}

/// Parse `spec` and apply it to `target`.
///
/// # Errors
///
/// Returns an error if `spec` is malformed or names an unregistered plugin;
/// `target` is untouched in both cases.
///
/// # Examples
///
/// ```
/// use invsync_cli::engine::transform;
/// use invsync_cli::transforms::PluginRegistry;
/// use serde_json::json;
///
/// let registry = PluginRegistry::with_builtins();
/// let source = json!({"name": "host1.example.com"});
/// let spec = json!({
///     "hostname": "name",
///     "short": {
///         "__function": "replace",
///         "value": "name",
///         "search": "\\.example\\.com$",
///         "replacement": ""
///     }
/// });
/// let mut target = serde_json::Map::new();
///
/// let report = transform(&registry, &spec, &source, &mut target).unwrap();
/// assert!(report.is_clean());
/// assert_eq!(target["hostname"], "host1.example.com");
/// assert_eq!(target["short"], "host1");
/// ```
pub fn transform(
    registry: &PluginRegistry,
    spec: &Document,
    source: &Document,
    target: &mut Mapping,
) -> Result<RunReport, ChangeSpecError> {
    let spec = ChangeSpec::parse(spec)?;
    TransformEngine::new(registry).run(&spec, source, target)
}
