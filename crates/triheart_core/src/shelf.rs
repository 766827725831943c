//! crates/triheart_core/src/shelf.rs
//!
//! The personal bookshelf: search, book detail, the user's relation to a book,
//! progress updates and the signed URLs the shelf UI needs.
//!
//! Relation writes return `PortResult` so callers learn that a progress save did
//! not land; lookups that only decorate the UI (signed URLs, dictionaries) are
//! best-effort and fall back to empty values.

use crate::domain::{
    BookRecord, DictionaryItem, RenderMode, ShelfFilters, ShelfPage, UserBookRelation,
};
use crate::ports::{BackendTransport, Method, Payload, PortResult};
use crate::relation::UnifiedBookView;
use crate::shelf_query::ShelfQueryBuilder;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const SEARCH_PATH: &str = "/book/query/mixed";
const BOOK_SIGNED_URL_PATH: &str = "/book/storage/signedUrl/download";
const DICTIONARY_PATH: &str = "/dictionary/query/byTypes";
const PAGE_PREVIEW_PATH: &str = "/page/webpUrl";
const RELATION_ADD_PATH: &str = "/bookUser/add";
const RELATION_UPDATE_PATH: &str = "/bookUser/update";
const RELATION_PAGE_PATH: &str = "/bookUser/query/page";
const RELATION_ALL_PATH: &str = "/bookUser/query/all";

/// Dictionary types the shelf loads when none are given.
pub const DEFAULT_DICTIONARY_TYPES: [&str; 2] = ["book_category", "book_sort"];
/// Format of `lastReadTime` as the backend stores it.
pub const READ_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_RELATION_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct ShelfService {
    transport: Arc<dyn BackendTransport>,
}

impl ShelfService {
    pub fn new(transport: Arc<dyn BackendTransport>) -> Self {
        Self { transport }
    }

    //=====================================================================================
    // Books
    //=====================================================================================

    /// Searches published books. Transport failures yield an empty page.
    pub async fn search_books(&self, filters: &ShelfFilters) -> ShelfPage<BookRecord> {
        let request = ShelfQueryBuilder::build_query(filters);
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "could not encode search request");
                return ShelfPage::empty();
            }
        };

        match self.transport.send(SEARCH_PATH, Method::Post, Payload::Json(body)).await {
            Ok(reply) => ShelfQueryBuilder::unwrap(reply),
            Err(e) => {
                warn!(error = %e, "book search failed");
                ShelfPage::empty()
            }
        }
    }

    pub async fn book_detail(&self, book_id: &str) -> PortResult<Option<BookRecord>> {
        let path = format!("/book/find/{}", book_id);
        let reply = self.transport.send(&path, Method::Post, Payload::Empty).await?;
        Ok(reply.into_data().and_then(|data| decode(data, "book detail")))
    }

    /// The book together with the current user's relation, if any.
    ///
    /// A failed relation lookup degrades to the public view.
    pub async fn unified_view(&self, book_id: &str) -> PortResult<Option<UnifiedBookView>> {
        let Some(book) = self.book_detail(book_id).await? else {
            return Ok(None);
        };

        let relation = self.find_relation(book_id).await.unwrap_or_else(|e| {
            warn!(book_id, error = %e, "relation lookup failed, showing public view");
            None
        });

        Ok(Some(match relation {
            Some(relation) => UnifiedBookView::personal(book, relation),
            None => UnifiedBookView::public(book),
        }))
    }

    //=====================================================================================
    // Relations
    //=====================================================================================

    pub async fn find_relation(&self, book_id: &str) -> PortResult<Option<UserBookRelation>> {
        let reply = self
            .transport
            .send(RELATION_ALL_PATH, Method::Post, Payload::Json(json!({ "bookId": book_id })))
            .await?;

        let Some(Value::Array(rows)) = reply.into_data() else {
            return Ok(None);
        };
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| decode(row, "book relation")))
    }

    /// Puts a book on the user's shelf, unpurchased, opened at page 1.
    pub async fn create_relation(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> PortResult<Option<UserBookRelation>> {
        let body = json!({
            "bookId": book_id,
            "userId": user_id,
            "purchaseStatus": "0",
            "lastReadPageNo": 1,
            "lastReadTime": now_read_time(),
        });
        let reply = self
            .transport
            .send(RELATION_ADD_PATH, Method::Post, Payload::Json(body))
            .await?;
        Ok(reply.into_data().and_then(|data| decode(data, "created relation")))
    }

    /// Records the page the user turned to. An empty relation id is a no-op.
    pub async fn update_last_read_page(
        &self,
        relation_id: &str,
        page_no: u32,
    ) -> PortResult<Option<UserBookRelation>> {
        if relation_id.is_empty() {
            debug!(page_no, "no relation to update");
            return Ok(None);
        }

        let body = json!({
            "modelId": relation_id,
            "lastReadPageNo": page_no,
            "lastReadTime": now_read_time(),
        });
        let reply = self
            .transport
            .send(RELATION_UPDATE_PATH, Method::Post, Payload::Json(body))
            .await?;
        Ok(reply.into_data().and_then(|data| decode(data, "updated relation")))
    }

    /// One page of the user's shelf.
    pub async fn query_relations(&self, page: Option<u32>, size: Option<u32>) -> ShelfPage<UserBookRelation> {
        let body = json!({
            "page": page.unwrap_or(1),
            "size": size.unwrap_or(DEFAULT_RELATION_PAGE_SIZE),
        });
        match self
            .transport
            .send(RELATION_PAGE_PATH, Method::Post, Payload::Json(body))
            .await
        {
            Ok(reply) => ShelfQueryBuilder::unwrap(reply),
            Err(e) => {
                warn!(error = %e, "shelf listing failed");
                ShelfPage::empty()
            }
        }
    }

    //=====================================================================================
    // Decorations
    //=====================================================================================

    /// Signs a book storage key. Absolute URLs pass through untouched.
    pub async fn signed_url(&self, object_key: &str) -> String {
        if object_key.is_empty() {
            return String::new();
        }
        if object_key.starts_with("http") {
            return object_key.to_string();
        }

        let payload = Payload::form([("objectKey", object_key)]);
        self.fetch_string(BOOK_SIGNED_URL_PATH, payload, "signed url").await
    }

    pub async fn cover_signed_url(&self, book_id: &str) -> String {
        let path = format!("/book/coverSignUrl/{}", book_id);
        self.fetch_string(&path, Payload::Empty, "cover signed url").await
    }

    /// Page image reference for shelf thumbnails. Unlike the reader's page
    /// resolver this does not classify denials: any failure is an empty string.
    pub async fn page_preview_url(&self, book_id: &str, page_no: u32, mode: RenderMode) -> String {
        let payload = Payload::Json(json!({
            "bookId": book_id,
            "pageNo": page_no,
            "webpType": mode.as_str(),
        }));
        self.fetch_string(PAGE_PREVIEW_PATH, payload, "page preview url").await
    }

    /// Loads dictionaries keyed by type. Empty `types` loads the shelf defaults.
    pub async fn dictionaries(&self, types: &[&str]) -> BTreeMap<String, Vec<DictionaryItem>> {
        let types = if types.is_empty() {
            &DEFAULT_DICTIONARY_TYPES[..]
        } else {
            types
        };
        let payload = Payload::form(types.iter().map(|t| ("dic_types", *t)));

        match self.transport.send(DICTIONARY_PATH, Method::Post, payload).await {
            Ok(reply) => reply
                .into_data()
                .and_then(|data| decode(data, "dictionaries"))
                .unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "dictionary lookup failed");
                BTreeMap::new()
            }
        }
    }

    async fn fetch_string(&self, path: &str, payload: Payload, what: &str) -> String {
        match self.transport.send(path, Method::Post, payload).await {
            Ok(reply) => match reply.into_data() {
                Some(Value::String(s)) => s,
                _ => String::new(),
            },
            Err(e) => {
                warn!(path, error = %e, "{} request failed", what);
                String::new()
            }
        }
    }
}

fn now_read_time() -> String {
    chrono::Local::now().format(READ_TIME_FORMAT).to_string()
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Option<T> {
    serde_json::from_value(data)
        .map_err(|e| warn!(error = %e, "could not decode {}", what))
        .ok()
}
