/// Request handlers for the editor page and the JSON API.
///
/// 1. `GET /`              – editor page, optionally with `?file=NAME`
/// 2. `GET /api/documents` – document listing with annotated subset
/// 3. `GET /api/document`  – raw text and spans of `?file=NAME`
/// 4. `GET /api/palette`   – ordered class palette
/// 5. `POST /save`         – replace the stored spans of a document
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;
use tracing::{error, warn};

use crate::palette::PaletteEntry;
use crate::store::{
    AnnotationBackend, DocumentListing, LoadedDocument, SaveRequest, SaveResponse, StoreError,
};
use crate::web::page;
use crate::web::server::AppContext;

type ApiError = (StatusCode, String);

fn internal_error(e: StoreError) -> ApiError {
    error!("Store error: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub file: String,
}

pub async fn index(
    State(ctx): State<AppContext>,
    Query(query): Query<FileQuery>,
) -> Result<Html<String>, ApiError> {
    let listing = ctx.store.list_documents().map_err(internal_error)?;
    let document = ctx.store.load_document(&query.file).map_err(internal_error)?;
    Ok(Html(page::render_page(
        &ctx.config,
        &ctx.palette,
        &listing,
        &document,
    )))
}

pub async fn list_documents(
    State(ctx): State<AppContext>,
) -> Result<Json<DocumentListing>, ApiError> {
    ctx.store
        .list_documents()
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_document(
    State(ctx): State<AppContext>,
    Query(query): Query<FileQuery>,
) -> Result<Json<LoadedDocument>, ApiError> {
    ctx.store
        .load_document(&query.file)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_palette(State(ctx): State<AppContext>) -> Json<Vec<PaletteEntry>> {
    Json(ctx.palette.entries().to_vec())
}

pub async fn save(
    State(ctx): State<AppContext>,
    Json(request): Json<SaveRequest>,
) -> Json<SaveResponse> {
    match ctx
        .store
        .save_annotations(&request.file, &request.annotations)
    {
        Ok(()) => Json(SaveResponse::ok()),
        Err(StoreError::MissingName) => {
            warn!("Save request without a file name");
            Json(SaveResponse::failed("No file specified"))
        }
        Err(e) => {
            warn!("Rejected save for {:?}: {e}", request.file);
            Json(SaveResponse::failed(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Span;
    use crate::config::Config;
    use crate::store::fs::FileStore;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn context() -> (TempDir, AppContext) {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("text"), dir.path().join("ann")).unwrap();
        fs::write(store.text_dir().join("fox.txt"), "The quick brown fox").unwrap();
        (dir, AppContext::new(Config::default(), store))
    }

    fn quick() -> Span {
        Span {
            text: "quick".to_string(),
            start: 4,
            end: 9,
            class: "PRODUCT".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_fetch() {
        let (_dir, ctx) = context();

        let reply = save(
            State(ctx.clone()),
            Json(SaveRequest {
                file: "fox.txt".to_string(),
                annotations: vec![quick()],
            }),
        )
        .await;
        assert_eq!(reply.0, SaveResponse::ok());

        let doc = get_document(
            State(ctx.clone()),
            Query(FileQuery {
                file: "fox.txt".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(doc.0.text, "The quick brown fox");
        assert_eq!(doc.0.annotations, vec![quick()]);

        let listing = list_documents(State(ctx)).await.unwrap();
        assert_eq!(listing.0.annotated, vec!["fox.txt"]);
    }

    #[tokio::test]
    async fn test_unknown_document_is_empty() {
        let (_dir, ctx) = context();
        let doc = get_document(
            State(ctx),
            Query(FileQuery {
                file: "missing.txt".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(doc.0, LoadedDocument::default());
    }

    #[tokio::test]
    async fn test_save_without_name_rejected() {
        let (dir, ctx) = context();
        let reply = save(State(ctx), Json(SaveRequest::default())).await;
        assert!(!reply.0.success);
        assert_eq!(reply.0.error.as_deref(), Some("No file specified"));
        assert_eq!(fs::read_dir(dir.path().join("ann")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_save_overlap_rejected() {
        let (_dir, ctx) = context();
        let mut overlapping = quick();
        overlapping.start = 5;
        overlapping.end = 12;
        overlapping.text = "uick br".to_string();

        let reply = save(
            State(ctx.clone()),
            Json(SaveRequest {
                file: "fox.txt".to_string(),
                annotations: vec![quick(), overlapping],
            }),
        )
        .await;
        assert!(!reply.0.success);
        assert!(!ctx.store.annotation_path("fox.txt").exists());
    }

    #[tokio::test]
    async fn test_index_page_renders_document() {
        let (_dir, ctx) = context();
        ctx.store.save_annotations("fox.txt", &[quick()]).unwrap();

        let page = index(
            State(ctx),
            Query(FileQuery {
                file: "fox.txt".to_string(),
            }),
        )
        .await
        .unwrap();

        assert!(page.0.contains("<title>NER Annotation Tool</title>"));
        assert!(page.0.contains("Current File: fox.txt"));
        assert!(page.0.contains("data-class=\"PRODUCT\" data-id=\"0\""));
        assert!(page.0.contains("file-item current annotated"));
    }

    #[tokio::test]
    async fn test_palette() {
        let (_dir, ctx) = context();
        let palette = get_palette(State(ctx)).await;
        assert_eq!(palette.0.len(), 19);
        assert_eq!(palette.0[0].name, "CARDINAL");
    }
}
