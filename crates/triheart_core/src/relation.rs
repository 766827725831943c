//! crates/triheart_core/src/relation.rs
//!
//! Purchase and reading-progress derivations over a `UserBookRelation`.
//! Nothing here is stored: each call recomputes from the relation's current
//! fields so an update is visible on the next read.

use crate::domain::{BookRecord, DisplayMode, ReadStatus, UserBookRelation};
use serde::Serialize;

impl UserBookRelation {
    fn current_page(&self) -> u32 {
        self.last_read_page_no.unwrap_or(0)
    }

    fn total_pages(&self) -> u32 {
        self.book_model.book_page_count.unwrap_or(0)
    }

    fn has_read_time(&self) -> bool {
        self.last_read_time.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_purchased(&self) -> bool {
        self.purchase_status == "1"
    }

    /// `"{current}/{total}"`, with missing numbers read as 0.
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.current_page(), self.total_pages())
    }

    pub fn read_status(&self) -> ReadStatus {
        let current = self.current_page();
        let total = self.total_pages();

        if !self.has_read_time() || current == 0 {
            return ReadStatus::Unread;
        }
        // An unknown total must not read as finished.
        if total > 0 && current >= total {
            return ReadStatus::Finished;
        }
        ReadStatus::Reading
    }

    /// Whole-number percentage in `0..=100`; 0 when the total is unknown.
    pub fn progress_percentage(&self) -> u8 {
        let total = u64::from(self.total_pages());
        if total == 0 {
            return 0;
        }
        let percent = u64::from(self.current_page()) * 100 / total;
        percent.min(100) as u8
    }
}

//=========================================================================================
// Unified View
//=========================================================================================

/// Read-only projection of a book plus, when the user has one, their relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedBookView {
    pub book: BookRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<UserBookRelation>,
    pub display_mode: DisplayMode,
}

/// The computed fields of a `UnifiedBookView` at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub purchased: bool,
    pub read_status: ReadStatus,
    pub read_status_label: &'static str,
    pub progress: String,
    pub percentage: u8,
}

impl UnifiedBookView {
    pub fn public(book: BookRecord) -> Self {
        Self {
            book,
            relation: None,
            display_mode: DisplayMode::Public,
        }
    }

    /// Personal view; the relation's embedded book model is replaced by `book`
    /// when it carries no page count of its own.
    pub fn personal(book: BookRecord, mut relation: UserBookRelation) -> Self {
        if relation.book_model.book_page_count.unwrap_or(0) == 0 {
            relation.book_model = book.clone();
        }
        Self {
            book,
            relation: Some(relation),
            display_mode: DisplayMode::Personal,
        }
    }

    pub fn is_purchased(&self) -> bool {
        self.relation.as_ref().is_some_and(UserBookRelation::is_purchased)
    }

    pub fn read_status(&self) -> ReadStatus {
        self.relation
            .as_ref()
            .map_or(ReadStatus::Unread, UserBookRelation::read_status)
    }

    pub fn progress_label(&self) -> String {
        match &self.relation {
            Some(relation) => relation.progress_label(),
            None => format!("0/{}", self.book.book_page_count.unwrap_or(0)),
        }
    }

    pub fn progress_percentage(&self) -> u8 {
        self.relation
            .as_ref()
            .map_or(0, UserBookRelation::progress_percentage)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let read_status = self.read_status();
        ProgressSnapshot {
            purchased: self.is_purchased(),
            read_status,
            read_status_label: read_status.label(),
            progress: self.progress_label(),
            percentage: self.progress_percentage(),
        }
    }
}
