//! Domain-specific error types for the inventory sync engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library modules return typed errors (e.g., [`PathError`],
//! [`ChangeSpecError`]) while command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! SyncError
//! ├── Path(PathError)           : dotted path resolution
//! ├── Spec(ChangeSpecError)     : change specification and plugin calls
//! ├── Config(ConfigError)       : config file loading
//! ├── Document(DocumentError)   : host document load/save
//! └── Inventory(InventoryError) : data-service requests
//! ```

use thiserror::Error;

/// Top-level error type for the inventory sync engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Path resolution error raised through the public accessor.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Malformed change specification or failing plugin call.
    #[error("Change specification error: {0}")]
    Spec(#[from] ChangeSpecError),

    /// Configuration-related error (I/O, parsing, presets).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Host document load or save error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Data-service request error.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Errors that arise while resolving a dotted path against a document.
///
/// `position` is always the zero-based index of the offending segment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A mapping does not contain the requested key.
    #[error("key #{position} '{key}' not found in data")]
    KeyNotFound {
        /// Index of the segment within the path.
        position: usize,
        /// The missing key.
        key: String,
    },

    /// A sequence is shorter than the requested index.
    #[error("list key #{position} int({index}) too large (length {len})")]
    IndexOutOfRange {
        /// Index of the segment within the path.
        position: usize,
        /// The attempted sequence index.
        index: usize,
        /// Length of the sequence that was indexed.
        len: usize,
    },

    /// A segment applied to a sequence is not a non-negative integer.
    #[error("list key #{position} '{segment}' is not a valid index")]
    InvalidIndex {
        /// Index of the segment within the path.
        position: usize,
        /// The segment text.
        segment: String,
    },

    /// A scalar was reached before the path was exhausted.
    #[error("key #{position} '{segment}' cannot index into a {kind}")]
    NotIndexable {
        /// Index of the segment within the path.
        position: usize,
        /// The segment text.
        segment: String,
        /// Structural kind of the node that was indexed.
        kind: String,
    },
}

/// Errors raised by the transformation engine and its plugins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangeSpecError {
    /// A change specification node is neither a path string nor a mapping.
    #[error("unsupported {kind} node at '{location}' in change specification")]
    UnsupportedNodeType {
        /// Dotted location of the node within the change specification.
        location: String,
        /// Structural kind that was found.
        kind: String,
    },

    /// A plugin call names a transform that is not registered.
    #[error("function '{0}' is unknown")]
    UnknownPlugin(String),

    /// A plugin call omits a parameter the plugin requires.
    #[error("function '{plugin}' requires parameter '{param}'")]
    MissingRequiredParam {
        /// Registered plugin name.
        plugin: String,
        /// The missing parameter.
        param: String,
    },

    /// A plugin parameter is present but unusable.
    #[error("function '{plugin}' parameter '{param}' is invalid: {reason}")]
    InvalidParam {
        /// Registered plugin name.
        plugin: String,
        /// The offending parameter.
        param: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A source lookup made by a plugin failed.
    #[error(transparent)]
    Path(#[from] PathError),
}

impl ChangeSpecError {
    /// Whether this error means the specification itself is malformed.
    ///
    /// Fatal errors abort the whole run; everything else is recorded per key.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedNodeType { .. } | Self::UnknownPlugin(_)
        )
    }
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("Invalid config syntax in {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A setting required by the current command is absent.
    #[error("Missing required setting '{0}'")]
    MissingSetting(String),

    /// A transform preset cannot be registered.
    #[error("Invalid transform preset '{name}': {reason}")]
    InvalidPreset {
        /// Preset name as declared in the config file.
        name: String,
        /// Human-readable explanation.
        reason: String,
    },
}

/// Errors that arise while loading or saving structured documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// An I/O error occurred while reading or writing a document.
    #[error("IO error on document {path}: {source}")]
    Io {
        /// Path to the document.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document could not be parsed.
    #[error("Failed to parse document {path}: {message}")]
    Parse {
        /// Path to the document.
        path: String,
        /// Parser message.
        message: String,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize document {path}: {message}")]
    Serialize {
        /// Path to the document.
        path: String,
        /// Serializer message.
        message: String,
    },

    /// The file extension does not map to a known format.
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Errors that arise while talking to the inventory data service.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The HTTP request failed or returned an error status.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport or status message.
        message: String,
    },

    /// The response body is not valid JSON.
    #[error("invalid response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// The response lacks a field the client depends on.
    #[error("response from {url} has no '{field}' field")]
    MissingField {
        /// Requested URL.
        url: String,
        /// The missing field.
        field: String,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // PathError
    // -----------------------------------------------------------------------

    #[test]
    fn path_error_key_not_found_display() {
        let e = PathError::KeyNotFound {
            position: 1,
            key: "z".to_string(),
        };
        assert_eq!(e.to_string(), "key #1 'z' not found in data");
    }

    #[test]
    fn path_error_index_out_of_range_display() {
        let e = PathError::IndexOutOfRange {
            position: 2,
            index: 7,
            len: 3,
        };
        assert_eq!(e.to_string(), "list key #2 int(7) too large (length 3)");
    }

    #[test]
    fn path_error_not_indexable_display() {
        let e = PathError::NotIndexable {
            position: 0,
            segment: "a".to_string(),
            kind: "scalar".to_string(),
        };
        assert!(e.to_string().contains("scalar"));
        assert!(e.to_string().contains("'a'"));
    }

    // -----------------------------------------------------------------------
    // ChangeSpecError
    // -----------------------------------------------------------------------

    #[test]
    fn change_spec_error_unknown_plugin_display() {
        let e = ChangeSpecError::UnknownPlugin("frobnicate".to_string());
        assert_eq!(e.to_string(), "function 'frobnicate' is unknown");
    }

    #[test]
    fn change_spec_error_missing_param_display() {
        let e = ChangeSpecError::MissingRequiredParam {
            plugin: "replace".to_string(),
            param: "search".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "function 'replace' requires parameter 'search'"
        );
    }

    #[test]
    fn change_spec_error_path_is_transparent() {
        let inner = PathError::KeyNotFound {
            position: 0,
            key: "name".to_string(),
        };
        let e: ChangeSpecError = inner.clone().into();
        assert_eq!(e.to_string(), inner.to_string());
    }

    #[test]
    fn only_malformed_spec_errors_are_fatal() {
        assert!(ChangeSpecError::UnknownPlugin("x".to_string()).is_fatal());
        assert!(
            ChangeSpecError::UnsupportedNodeType {
                location: "a".to_string(),
                kind: "sequence".to_string(),
            }
            .is_fatal()
        );
        assert!(
            !ChangeSpecError::MissingRequiredParam {
                plugin: "replace".to_string(),
                param: "value".to_string(),
            }
            .is_fatal()
        );
        assert!(
            !ChangeSpecError::Path(PathError::InvalidIndex {
                position: 0,
                segment: "x".to_string(),
            })
            .is_fatal()
        );
    }

    // -----------------------------------------------------------------------
    // ConfigError / DocumentError / InventoryError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/etc/invsync.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.to_string().contains("/etc/invsync.toml"));
        assert!(e.source().is_some());
    }

    #[test]
    fn config_error_missing_setting_display() {
        let e = ConfigError::MissingSetting("token".to_string());
        assert_eq!(e.to_string(), "Missing required setting 'token'");
    }

    #[test]
    fn document_error_unsupported_format_display() {
        let e = DocumentError::UnsupportedFormat("host.ini".to_string());
        assert_eq!(e.to_string(), "Unsupported document format: host.ini");
    }

    #[test]
    fn inventory_error_missing_field_display() {
        let e = InventoryError::MissingField {
            url: "https://netbox/api/dcim/racks".to_string(),
            field: "results".to_string(),
        };
        assert!(e.to_string().contains("'results'"));
    }

    // -----------------------------------------------------------------------
    // SyncError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn sync_error_from_path_error() {
        let e: SyncError = PathError::KeyNotFound {
            position: 0,
            key: "a".to_string(),
        }
        .into();
        assert!(e.to_string().contains("Path error"));
    }

    #[test]
    fn sync_error_from_spec_error() {
        let e: SyncError = ChangeSpecError::UnknownPlugin("bad".to_string()).into();
        assert!(e.to_string().contains("Change specification error"));
        assert!(e.to_string().contains("bad"));
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<SyncError>();
        assert_send_sync::<PathError>();
        assert_send_sync::<ChangeSpecError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<DocumentError>();
        assert_send_sync::<InventoryError>();
    }

    #[test]
    fn spec_error_converts_to_anyhow() {
        let e = ChangeSpecError::UnknownPlugin("x".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
