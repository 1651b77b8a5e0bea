//! Per-run record of what the engine did and which keys failed.
use std::fmt;

use crate::document::NodeKind;
use crate::error::{ChangeSpecError, PathError};
use crate::logging::SKIP_TARGET;
use crate::path::Path;

/// Why a single target key was not produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// A literal path did not resolve against the source.
    Lookup {
        /// The source path that was looked up.
        source: Path,
        /// The resolution failure.
        error: PathError,
    },
    /// A plugin call failed.
    Plugin {
        /// Name the plugin was invoked by.
        name: String,
        /// The plugin's error.
        error: ChangeSpecError,
    },
    /// A nested specification met an existing target value that is not a
    /// mapping.
    NotAMapping {
        /// Kind of the value found at the key.
        found: NodeKind,
    },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup { source, error } => write!(f, "'{source}': {error}"),
            Self::Plugin { name, error } => write!(f, "{name}: {error}"),
            Self::NotAMapping { found } => {
                write!(f, "existing {found} value cannot hold nested changes")
            }
        }
    }
}

/// A failure recorded at a dotted target location.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFailure {
    /// Location within the target document.
    pub location: Path,
    /// What went wrong.
    pub kind: FailureKind,
}

impl fmt::Display for RecordedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

/// Outcome of one engine run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Keys that were skipped, in processing order.
    pub failures: Vec<RecordedFailure>,
    /// Literal values copied into the target.
    pub assigned: usize,
    /// Plugin invocations (successful or not).
    pub plugin_calls: usize,
    /// Empty mappings removed after recursion or a plugin call.
    pub pruned: usize,
}

impl RunReport {
    /// Record a failure and emit it as a debug event.
    pub(crate) fn record(&mut self, location: Path, kind: FailureKind) {
        tracing::debug!(
            target: SKIP_TARGET,
            location = %location,
            reason = %kind,
            "skipped"
        );
        self.failures.push(RecordedFailure { location, kind });
    }

    /// Whether every key was produced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn default_report_is_clean() {
        let report = RunReport::default();
        assert!(report.is_clean());
        assert_eq!(report.assigned, 0);
    }

    #[test]
    fn recorded_failure_display() {
        let mut report = RunReport::default();
        report.record(
            Path::parse("site.slug"),
            FailureKind::Lookup {
                source: Path::parse("site.name"),
                error: PathError::KeyNotFound {
                    position: 1,
                    key: "name".to_string(),
                },
            },
        );
        assert!(!report.is_clean());
        assert_eq!(
            report.failures[0].to_string(),
            "site.slug: 'site.name': key #1 'name' not found in data"
        );
    }

    #[test]
    fn not_a_mapping_display() {
        let failure = RecordedFailure {
            location: Path::parse("vlan"),
            kind: FailureKind::NotAMapping {
                found: NodeKind::Scalar,
            },
        };
        assert_eq!(
            failure.to_string(),
            "vlan: existing scalar value cannot hold nested changes"
        );
    }
}
