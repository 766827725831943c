//! crates/triheart_core/src/shelf_query.rs
//!
//! Translates bookshelf filter/sort intent into the backend's search body and
//! unwraps paginated replies. Both directions degrade instead of failing: a bad
//! sort token becomes the default sort, a bad reply becomes an empty page.

use crate::domain::{NormalizedRequest, ShelfFilters, ShelfPage, SortDirection, SortItem};
use crate::ports::BackendReply;
use crate::rows::decode_rows;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The only `bookStatus` this surface can query.
pub const PUBLISHED_STATUS: &str = "1";
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 96;
pub const DEFAULT_SORT_FIELD: &str = "updateTimestamp";

pub struct ShelfQueryBuilder;

impl ShelfQueryBuilder {
    pub fn build_query(filters: &ShelfFilters) -> NormalizedRequest {
        let keyword = filters.keyword.as_deref().filter(|k| !k.is_empty());
        let categories = (!filters.categories.is_empty()).then(|| filters.categories.clone());

        NormalizedRequest {
            book_status: PUBLISHED_STATUS.to_string(),
            page: filters.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            size: filters.size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE),
            sort_items: vec![parse_sort(filters.sort.as_deref())],
            mixed_input: keyword.map(str::to_string),
            enable_like_query: keyword.map(|_| true),
            book_categories: categories,
        }
    }

    /// Extracts `{content, total}` from a paginated reply.
    pub fn unwrap<T: DeserializeOwned>(reply: BackendReply) -> ShelfPage<T> {
        let Some(data) = reply.into_data() else {
            return ShelfPage::empty();
        };
        unwrap_page(data)
    }
}

pub fn default_sort() -> SortItem {
    SortItem {
        field_name: DEFAULT_SORT_FIELD.to_string(),
        direction: SortDirection::Desc,
    }
}

/// Parses a `"field,DIRECTION"` token. Anything other than a non-empty field
/// followed by exactly `ASC` or `DESC` yields the default sort.
fn parse_sort(token: Option<&str>) -> SortItem {
    let Some((field, rest)) = token.and_then(|t| t.split_once(',')) else {
        return default_sort();
    };
    let direction = match rest.split(',').next() {
        Some("ASC") => SortDirection::Asc,
        Some("DESC") => SortDirection::Desc,
        _ => return default_sort(),
    };
    if field.is_empty() {
        return default_sort();
    }
    SortItem {
        field_name: field.to_string(),
        direction,
    }
}

fn unwrap_page<T: DeserializeOwned>(data: Value) -> ShelfPage<T> {
    let total = match data.get("total") {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .unwrap_or(0);

    let items = match data.get("content") {
        Some(content) if !content.is_null() => decode_rows(content.clone(), "page content"),
        _ => Vec::new(),
    };

    ShelfPage { items, total }
}
