/// Annotation store: document listing, document fetch and span persistence.
///
/// [`AnnotationBackend`] is the seam between the editing session and
/// storage. [`fs::FileStore`] works on the local directories;
/// [`http::HttpStore`] talks to a running server.
pub mod fs;
pub mod http;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::Span;

/// Suffix appended to a document name to form its annotation file name.
pub const ANNOTATION_SUFFIX: &str = ".json";

/// Suffix identifying source documents.
pub const DOCUMENT_SUFFIX: &str = ".txt";

/// Errors that can occur while reading or writing annotations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no document name given")]
    MissingName,

    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    #[error("annotations {0} and {1} overlap")]
    Overlap(usize, usize),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed annotation file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("save rejected: {0}")]
    Rejected(String),
}

/// Available documents and the subset that already has saved annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentListing {
    pub files: Vec<String>,
    pub annotated: Vec<String>,
}

impl DocumentListing {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }

    #[must_use]
    pub fn is_annotated(&self, name: &str) -> bool {
        self.annotated.iter().any(|f| f == name)
    }
}

/// A document as served to the editor. Unknown names load as the empty
/// document (empty name, text and span list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub file: String,
    pub text: String,
    pub annotations: Vec<Span>,
}

impl LoadedDocument {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }
}

/// Body of `POST /save`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub annotations: Vec<Span>,
}

/// Reply to `POST /save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Storage operations used by the editor.
///
/// Implementations must be `Send + Sync` so they can sit behind `Arc`.
pub trait AnnotationBackend: Send + Sync {
    /// List documents, sorted by name, with their annotated subset.
    fn list_documents(&self) -> Result<DocumentListing, StoreError>;

    /// Load a document and its saved spans. Unknown names are not an error.
    fn load_document(&self, name: &str) -> Result<LoadedDocument, StoreError>;

    /// Replace the stored span list of `name` with `spans`.
    fn save_annotations(&self, name: &str, spans: &[Span]) -> Result<(), StoreError>;
}

/// A document name must be a single plain path component.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::MissingName);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name && !name.contains(['\0', '\\']) => Ok(()),
        _ => Err(StoreError::InvalidName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("news_01.txt").is_ok());
        assert!(validate_name("a..b.txt").is_ok());
        assert!(matches!(validate_name(""), Err(StoreError::MissingName)));
        for bad in ["..", ".", "../x.txt", "dir/x.txt", "/etc/passwd", "x.txt/", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_name(bad), Err(StoreError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_save_request_defaults() {
        let req: SaveRequest = serde_json::from_str("{}").unwrap();
        assert!(req.file.is_empty());
        assert!(req.annotations.is_empty());
    }

    #[test]
    fn test_save_response_shape() {
        assert_eq!(serde_json::to_string(&SaveResponse::ok()).unwrap(), r#"{"success":true}"#);
        assert_eq!(
            serde_json::to_string(&SaveResponse::failed("No file specified")).unwrap(),
            r#"{"success":false,"error":"No file specified"}"#
        );
    }
}
