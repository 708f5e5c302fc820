/// HTTP client backend: drives a running server through its JSON endpoints.
use std::time::Duration;

use reqwest::blocking::Client;

use super::{
    AnnotationBackend, DocumentListing, LoadedDocument, SaveRequest, SaveResponse, StoreError,
};
use crate::annotation::Span;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("entitytagger/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl AnnotationBackend for HttpStore {
    fn list_documents(&self) -> Result<DocumentListing, StoreError> {
        let listing = self
            .client
            .get(self.url("/api/documents"))
            .send()?
            .error_for_status()?
            .json()?;
        Ok(listing)
    }

    fn load_document(&self, name: &str) -> Result<LoadedDocument, StoreError> {
        let doc = self
            .client
            .get(self.url("/api/document"))
            .query(&[("file", name)])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(doc)
    }

    fn save_annotations(&self, name: &str, spans: &[Span]) -> Result<(), StoreError> {
        let body = SaveRequest {
            file: name.to_string(),
            annotations: spans.to_vec(),
        };
        let reply: SaveResponse = self
            .client
            .post(self.url("/save"))
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        if reply.success {
            Ok(())
        } else {
            Err(StoreError::Rejected(reply.error.unwrap_or_default()))
        }
    }
}
