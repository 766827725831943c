//! crates/triheart_core/src/annotations.rs
//!
//! Fetches the per-page overlays (terms, notes, attachments).
//!
//! Overlays are optional enrichment: the page body renders without them, so
//! every failure here is logged and turned into an empty result.

use crate::domain::{AnnotationSet, PageAttachment, PageNote, PageTerm, RenderMode};
use crate::ports::{BackendTransport, Method, Payload};
use crate::rows::decode_rows;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const TERMS_PATH: &str = "/pageTerm/query/all";
const NOTES_PATH: &str = "/bookNote/query/all";
const ATTACHMENTS_PATH: &str = "/pageAttachment/query/all";
const ATTACHMENT_SIGNED_URL_PATH: &str = "/pageAttachment/storage/signedUrl/download";

#[derive(Clone)]
pub struct PageAnnotationAggregator {
    transport: Arc<dyn BackendTransport>,
}

impl PageAnnotationAggregator {
    pub fn new(transport: Arc<dyn BackendTransport>) -> Self {
        Self { transport }
    }

    pub async fn fetch_terms(&self, book_id: &str, page_no: u32, mode: RenderMode) -> Vec<PageTerm> {
        self.fetch_list(TERMS_PATH, "terms", book_id, page_no, mode).await
    }

    /// Highlight rectangles come back already converted to `mode` by the backend.
    pub async fn fetch_notes(&self, book_id: &str, page_no: u32, mode: RenderMode) -> Vec<PageNote> {
        self.fetch_list(NOTES_PATH, "notes", book_id, page_no, mode).await
    }

    pub async fn fetch_attachments(
        &self,
        book_id: &str,
        page_no: u32,
        mode: RenderMode,
    ) -> Vec<PageAttachment> {
        self.fetch_list(ATTACHMENTS_PATH, "attachments", book_id, page_no, mode)
            .await
    }

    /// Runs the three fetchers concurrently and stamps the result with `mode`.
    pub async fn fetch_all(&self, book_id: &str, page_no: u32, mode: RenderMode) -> AnnotationSet {
        let (terms, notes, attachments) = futures::join!(
            self.fetch_terms(book_id, page_no, mode),
            self.fetch_notes(book_id, page_no, mode),
            self.fetch_attachments(book_id, page_no, mode),
        );

        AnnotationSet {
            book_id: book_id.to_string(),
            page_no,
            mode,
            terms,
            notes,
            attachments,
        }
    }

    /// Turns an attachment object key into a time-limited download URL.
    /// Returns an empty string on any failure.
    pub async fn resolve_attachment_url(&self, file_path: &str) -> String {
        if file_path.is_empty() {
            return String::new();
        }

        let reply = match self
            .transport
            .send(
                ATTACHMENT_SIGNED_URL_PATH,
                Method::Post,
                Payload::form([("objectKey", file_path)]),
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(file_path, error = %e, "attachment signed url request failed");
                return String::new();
            }
        };

        match reply.into_data() {
            Some(Value::String(url)) => url,
            _ => {
                warn!(file_path, "attachment signed url missing from reply");
                String::new()
            }
        }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: &str,
        book_id: &str,
        page_no: u32,
        mode: RenderMode,
    ) -> Vec<T> {
        let payload = json!({
            "bookId": book_id,
            "pageNo": page_no,
            "imageMode": mode.as_str(),
        });

        let reply = match self.transport.send(path, Method::Post, Payload::Json(payload)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(book_id, page_no, kind, error = %e, "failed to fetch page {}", kind);
                return Vec::new();
            }
        };

        let Some(data) = reply.into_data() else {
            debug!(book_id, page_no, kind, "no {} for page", kind);
            return Vec::new();
        };

        decode_rows(data, kind)
    }
}
