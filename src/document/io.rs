//! Structured document file I/O.
//!
//! The format is chosen from the file extension. Formatting and comments
//! are not preserved: a saved document is the canonical serialization of
//! its value.
use std::fs;
use std::path::Path;

use super::Document;
use crate::error::DocumentError;

/// Supported on-disk document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yml` / `.yaml`
    Yaml,
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl DocumentFormat {
    /// Pick the format for `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse `content` in the given format.
///
/// Empty YAML content parses to an empty mapping.
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] if the content is malformed; `origin`
/// names the source in the message.
pub fn parse(content: &str, format: DocumentFormat, origin: &str) -> Result<Document, DocumentError> {
    let parse_err = |message: String| DocumentError::Parse {
        path: origin.to_string(),
        message,
    };
    let doc = match format {
        DocumentFormat::Yaml => {
            let doc: Document =
                serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            if doc.is_null() {
                Document::Object(super::Mapping::new())
            } else {
                doc
            }
        }
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };
    Ok(doc)
}

/// Serialize `doc` in the given format.
///
/// # Errors
///
/// Returns [`DocumentError::Serialize`] if the value cannot be represented
/// (e.g. a null inside a TOML document); `origin` names the target.
pub fn render(doc: &Document, format: DocumentFormat, origin: &str) -> Result<String, DocumentError> {
    let ser_err = |message: String| DocumentError::Serialize {
        path: origin.to_string(),
        message,
    };
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(doc).map_err(|e| ser_err(e.to_string())),
        DocumentFormat::Json => serde_json::to_string_pretty(doc)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ser_err(e.to_string())),
        DocumentFormat::Toml => toml::to_string_pretty(doc).map_err(|e| ser_err(e.to_string())),
    }
}

/// Load the document at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, its extension is not
/// supported, or its content does not parse.
pub fn load(path: &Path) -> Result<Document, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, format, &path.display().to_string())
}

/// Whether saving `doc` to `path` would change the file's content.
///
/// A missing file always differs.
///
/// # Errors
///
/// Returns an error if `doc` cannot be serialized.
pub fn differs(path: &Path, doc: &Document) -> Result<bool, DocumentError> {
    let format = DocumentFormat::from_path(path)?;
    let rendered = render(doc, format, &path.display().to_string())?;
    Ok(fs::read_to_string(path).map_or(true, |current| current != rendered))
}

/// Save `doc` to `path`, returning `true` if the file was written.
///
/// Unchanged content is not rewritten. The new content is written to a
/// sibling temporary file and renamed into place.
///
/// # Errors
///
/// Returns an error if `doc` cannot be serialized or the file cannot be
/// written.
pub fn save(path: &Path, doc: &Document) -> Result<bool, DocumentError> {
    let origin = path.display().to_string();
    let format = DocumentFormat::from_path(path)?;
    let rendered = render(doc, format, &origin)?;

    if fs::read_to_string(path).is_ok_and(|current| current == rendered) {
        return Ok(false);
    }

    let io_err = |source| DocumentError::Io {
        path: origin.clone(),
        source,
    };
    let file_name = path
        .file_name()
        .map_or_else(|| "document".into(), |n| n.to_string_lossy().into_owned());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, rendered).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::document::equals;
    use serde_json::json;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("host_vars/a.yml")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.YAML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.json")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.toml")).unwrap(),
            DocumentFormat::Toml
        );
        assert!(DocumentFormat::from_path(Path::new("a.ini")).is_err());
        assert!(DocumentFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn empty_yaml_is_empty_mapping() {
        let doc = parse("", DocumentFormat::Yaml, "empty.yml").unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn yaml_preserves_key_order() {
        let doc = parse("b: 1\na: 2\n", DocumentFormat::Yaml, "t.yml").unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn malformed_content_is_parse_error() {
        let err = parse("{not json", DocumentFormat::Json, "bad.json").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn toml_cannot_hold_null() {
        let err = render(&json!({"a": null}), DocumentFormat::Toml, "x.toml");
        assert!(err.is_err());
    }

    #[test]
    fn save_and_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host1.example.com.yml");
        let doc = json!({"hostname": "host1", "ports": [1, 2], "nested": {"k": true}});

        assert!(save(&path, &doc).unwrap(), "first save writes the file");
        let loaded = load(&path).unwrap();
        assert!(equals(&doc, &loaded));
    }

    #[test]
    fn save_skips_unchanged_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let doc = json!({"a": 1});
        assert!(save(&path, &doc).unwrap());
        assert!(!save(&path, &doc).unwrap(), "second save is a no-op");
        assert!(!differs(&path, &doc).unwrap());
        assert!(differs(&path, &json!({"a": 2})).unwrap());
    }

    #[test]
    fn save_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.toml");
        save(&path, &json!({"name": "x"})).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
