//! Page-access and bookshelf logic for the TriHeart reader.
//!
//! The crate owns no transport: every component is built over an
//! `Arc<dyn BackendTransport>` supplied by the caller.

pub mod annotations;
pub mod domain;
pub mod page_access;
pub mod ports;
pub mod relation;
mod rows;
pub mod shelf;
pub mod shelf_query;

pub use annotations::PageAnnotationAggregator;
pub use domain::{
    AnnotationSet, BookRecord, DictionaryItem, DisplayMode, NormalizedRequest, PageAttachment,
    PageDescriptor, PageNote, PageStatus, PageTerm, ReadStatus, ReasonCode, Rect, RenderMode,
    ShelfFilters, ShelfPage, SortDirection, SortItem, UserBookRelation,
};
pub use page_access::{PageAccessResolver, PageDenial};
pub use ports::{BackendReply, BackendTransport, Method, Payload, PortError, PortResult};
pub use relation::{ProgressSnapshot, UnifiedBookView};
pub use shelf::ShelfService;
pub use shelf_query::ShelfQueryBuilder;
