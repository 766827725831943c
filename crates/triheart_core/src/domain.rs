//! crates/triheart_core/src/domain.rs
//!
//! Defines the data structures exchanged with the TriHeart backend.
//! Field names follow the backend's camelCase wire format; everything that the
//! backend may omit is either `Option` or defaulted.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

//=========================================================================================
// Render / Coordinate Mode
//=========================================================================================

/// Whether page imagery (and the overlay rectangles drawn on it) are expressed in
/// the cropped or the original page coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Crop,
    Origin,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Crop => "crop",
            RenderMode::Origin => "origin",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crop" => Ok(RenderMode::Crop),
            "origin" => Ok(RenderMode::Origin),
            other => Err(format!("'{}' is not a render mode (expected crop or origin)", other)),
        }
    }
}

//=========================================================================================
// Page Delivery
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Allow,
    Locked,
    Loading,
    Error,
}

/// Machine-readable reason attached to a locked page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    TrialLimit,
}

/// The outcome of one page resolution.
///
/// Built only through the constructors below so that `Allow` always carries a
/// URL and `Locked`/`Error` always carry a message. `width`/`height` are left
/// at 0; the caller measures the image after it loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub book_id: String,
    pub page_no: u32,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl PageDescriptor {
    fn base(book_id: &str, page_no: u32, status: PageStatus) -> Self {
        Self {
            book_id: book_id.to_string(),
            page_no,
            status,
            url: None,
            reason_code: None,
            message: None,
            width: 0,
            height: 0,
        }
    }

    /// Placeholder state shown while a fetch is in flight.
    pub fn loading(book_id: &str, page_no: u32) -> Self {
        Self::base(book_id, page_no, PageStatus::Loading)
    }

    pub fn allow(book_id: &str, page_no: u32, url: String) -> Self {
        debug_assert!(!url.is_empty());
        Self {
            url: Some(url),
            ..Self::base(book_id, page_no, PageStatus::Allow)
        }
    }

    pub fn locked(book_id: &str, page_no: u32, reason: Option<ReasonCode>, message: String) -> Self {
        debug_assert!(!message.is_empty());
        Self {
            reason_code: reason,
            message: Some(message),
            ..Self::base(book_id, page_no, PageStatus::Locked)
        }
    }

    pub fn error(book_id: &str, page_no: u32, message: String) -> Self {
        debug_assert!(!message.is_empty());
        Self {
            message: Some(message),
            ..Self::base(book_id, page_no, PageStatus::Error)
        }
    }

    /// True only for a deliverable page.
    pub fn is_allowed(&self) -> bool {
        self.status == PageStatus::Allow
    }
}

//=========================================================================================
// Page Annotations
//=========================================================================================

/// A rectangle `[x, y, w, h]` in the coordinate space of its `AnnotationSet`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect(pub f64, pub f64, pub f64, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTerm {
    pub book_id: String,
    pub page_no: u32,
    pub term_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub term_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub term_explanation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rects_json: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNote {
    pub model_id: String,
    pub book_id: String,
    pub page_no: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlight_rects: Vec<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_private: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttachment {
    pub model_id: String,
    pub book_id: String,
    pub page_no: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachment_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachment_type_display: String,
    pub file_path: String,
    /// Free-form backend data, passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Every overlay for one page, all in the same coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSet {
    pub book_id: String,
    pub page_no: u32,
    pub mode: RenderMode,
    pub terms: Vec<PageTerm>,
    pub notes: Vec<PageNote>,
    pub attachments: Vec<PageAttachment>,
}

impl AnnotationSet {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.notes.is_empty() && self.attachments.is_empty()
    }
}

//=========================================================================================
// Books and User Relations
//=========================================================================================

/// Book metadata as owned by the backend. The client holds a read-only copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub model_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub book_title: String,
    pub book_subtitle: Option<String>,
    pub book_isbn: Option<String>,
    pub book_author: Option<String>,
    pub book_translator: Option<String>,
    /// Backend-relative object key; resolve it through a signed URL.
    pub book_cover: Option<String>,
    pub book_summary: Option<String>,
    pub book_page_count: Option<u32>,
    pub toc_begin_page: Option<u32>,
    pub toc_end_page: Option<u32>,
    /// First body page (table-of-contents pages are not counted).
    pub body_page_offset: Option<u32>,
    pub book_category: Option<String>,
    pub book_category_display: Option<String>,
    pub book_status: Option<String>,
    pub book_status_display: Option<String>,
    pub book_list_price: Option<f64>,
    pub book_sale_price: Option<f64>,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
}

/// The link between a user and a book: purchase and reading-progress state.
///
/// Only changed through explicit shelf calls; the derivations in
/// `relation.rs` recompute from these fields on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBookRelation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub book_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_page_no: Option<u32>,
    #[serde(default = "default_purchase_status", deserialize_with = "string_or_number")]
    pub purchase_status: String,
    #[serde(default = "empty_book_model", deserialize_with = "null_as_empty_book")]
    pub book_model: BookRecord,
}

fn default_purchase_status() -> String {
    "0".to_string()
}

fn empty_book_model() -> BookRecord {
    BookRecord {
        book_page_count: Some(0),
        ..BookRecord::default()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => default_purchase_status(),
    })
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_book<'de, D>(deserializer: D) -> Result<BookRecord, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BookRecord>::deserialize(deserializer)?.unwrap_or_else(empty_book_model))
}

/// Three-way reading classification of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    Unread,
    Reading,
    Finished,
}

impl ReadStatus {
    /// The label shown on the bookshelf.
    pub fn label(&self) -> &'static str {
        match self {
            ReadStatus::Unread => "未读",
            ReadStatus::Reading => "在读",
            ReadStatus::Finished => "已读",
        }
    }
}

impl std::fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Public,
    Personal,
}

//=========================================================================================
// Shelf Queries
//=========================================================================================

/// What the bookshelf UI asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShelfFilters {
    pub keyword: Option<String>,
    pub categories: Vec<String>,
    /// A single `"field,DIRECTION"` token.
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortItem {
    pub field_name: String,
    pub direction: SortDirection,
}

/// The search body sent to `/book/query/mixed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRequest {
    pub book_status: String,
    pub page: u32,
    pub size: u32,
    pub sort_items: Vec<SortItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixed_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_like_query: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_categories: Option<Vec<String>>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> ShelfPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

impl<T> Default for ShelfPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A backend dictionary entry (categories, sort options, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryItem {
    pub dic_label: String,
    pub dic_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dic_sort: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
