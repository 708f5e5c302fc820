/// Filesystem-backed annotation store.
///
/// Documents are the `*.txt` files directly inside the text directory.
/// Annotations for document `X` live in `<annotations_dir>/X.json`. There is
/// no caching and no locking; the last writer wins.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{
    ANNOTATION_SUFFIX, AnnotationBackend, DOCUMENT_SUFFIX, DocumentListing, LoadedDocument,
    StoreError, validate_name,
};
use crate::annotation::{Span, find_conflict};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct FileStore {
    text_dir: PathBuf,
    annotations_dir: PathBuf,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileStore {
    /// Create a store without touching the filesystem.
    pub fn new(text_dir: impl Into<PathBuf>, annotations_dir: impl Into<PathBuf>) -> Self {
        Self {
            text_dir: text_dir.into(),
            annotations_dir: annotations_dir.into(),
        }
    }

    /// Create a store, making sure both directories exist.
    pub fn open(
        text_dir: impl Into<PathBuf>,
        annotations_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let store = Self::new(text_dir, annotations_dir);
        for dir in [&store.text_dir, &store.annotations_dir] {
            fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        info!(
            "Annotation store: documents in {}, annotations in {}",
            store.text_dir.display(),
            store.annotations_dir.display()
        );
        Ok(store)
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::open(&config.text_files_dir, &config.annotations_dir)
    }

    #[must_use]
    pub fn text_dir(&self) -> &Path {
        &self.text_dir
    }

    #[must_use]
    pub fn annotations_dir(&self) -> &Path {
        &self.annotations_dir
    }

    #[must_use]
    pub fn annotation_path(&self, name: &str) -> PathBuf {
        self.annotations_dir
            .join(format!("{name}{ANNOTATION_SUFFIX}"))
    }

    /// A known document: a valid name ending in `.txt` that names a regular
    /// file directly inside the text directory.
    #[must_use]
    pub fn is_document(&self, name: &str) -> bool {
        validate_name(name).is_ok()
            && name.ends_with(DOCUMENT_SUFFIX)
            && self.text_dir.join(name).is_file()
    }

    fn read_annotations(&self, name: &str) -> Result<Vec<Span>, StoreError> {
        let path = self.annotation_path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path).map_err(io_err(&path))?;
        serde_json::from_str(&data).map_err(|source| StoreError::Json { path, source })
    }
}

impl AnnotationBackend for FileStore {
    fn list_documents(&self) -> Result<DocumentListing, StoreError> {
        let mut files = Vec::new();
        if self.text_dir.is_dir() {
            for entry in fs::read_dir(&self.text_dir).map_err(io_err(&self.text_dir))? {
                let entry = entry.map_err(io_err(&self.text_dir))?;
                if let Some(name) = entry.file_name().to_str() {
                    if self.is_document(name) {
                        files.push(name.to_string());
                    }
                }
            }
        }
        files.sort();

        let annotated = files
            .iter()
            .filter(|f| self.annotation_path(f).is_file())
            .cloned()
            .collect();

        Ok(DocumentListing { files, annotated })
    }

    fn load_document(&self, name: &str) -> Result<LoadedDocument, StoreError> {
        if !self.is_document(name) {
            debug!("Unknown document requested: {name:?}");
            return Ok(LoadedDocument::default());
        }

        let path = self.text_dir.join(name);
        let text = fs::read_to_string(&path).map_err(io_err(&path))?;
        let annotations = self.read_annotations(name)?;

        Ok(LoadedDocument {
            file: name.to_string(),
            text,
            annotations,
        })
    }

    fn save_annotations(&self, name: &str, spans: &[Span]) -> Result<(), StoreError> {
        validate_name(name)?;
        if let Some((a, b)) = find_conflict(spans) {
            return Err(StoreError::Overlap(a, b));
        }

        let path = self.annotation_path(name);
        let data = serde_json::to_string_pretty(spans).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(io_err(&path))?;

        info!("Saved {} annotation(s) for {name}", spans.len());
        Ok(())
    }
}
