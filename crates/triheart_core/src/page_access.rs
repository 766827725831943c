//! crates/triheart_core/src/page_access.rs
//!
//! Decides whether a single book page may be delivered to the reader.
//!
//! Every call ends in a `PageDescriptor`; no failure escapes `resolve_page`.
//! Internally the backend outcome is first folded into
//! `Result<String, PageDenial>` so the failure kinds stay distinguishable until
//! the very last conversion.

use crate::domain::{PageDescriptor, ReasonCode, RenderMode};
use crate::ports::{BackendTransport, Method, Payload, PortError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shown whenever a page is locked without a usable backend message.
pub const TRIAL_LIMIT_MESSAGE: &str = "试读结束，购买后解锁全文";
/// Shown when no usable response reached the client.
pub const NETWORK_ERROR_MESSAGE: &str = "网络请求失败";
/// Shown when the backend accepted the request but sent no image reference.
pub const MISSING_URL_MESSAGE: &str = "页面地址缺失";

const WEBP_URL_PATH: &str = "/page/webpUrl";

/// Why a page could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDenial {
    /// No HTTP response was obtained, or the transport failed in a way that
    /// says nothing about access rights.
    Transport(String),
    /// The transport reported HTTP 403.
    Forbidden,
    /// The backend answered with a false business flag.
    TrialLimit { message: Option<String> },
    /// The business flag was set but no image reference came with it.
    Malformed,
}

impl PageDenial {
    fn from_port(err: PortError) -> Self {
        match err {
            PortError::Forbidden => PageDenial::Forbidden,
            other => PageDenial::Transport(other.to_string()),
        }
    }

    /// Converts the denial into the descriptor shown for `(book_id, page_no)`.
    pub fn into_descriptor(self, book_id: &str, page_no: u32) -> PageDescriptor {
        match self {
            PageDenial::Transport(_) => {
                PageDescriptor::error(book_id, page_no, NETWORK_ERROR_MESSAGE.to_string())
            }
            PageDenial::Forbidden => {
                PageDescriptor::locked(book_id, page_no, None, TRIAL_LIMIT_MESSAGE.to_string())
            }
            PageDenial::TrialLimit { message } => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| TRIAL_LIMIT_MESSAGE.to_string());
                PageDescriptor::locked(book_id, page_no, Some(ReasonCode::TrialLimit), message)
            }
            PageDenial::Malformed => {
                PageDescriptor::error(book_id, page_no, MISSING_URL_MESSAGE.to_string())
            }
        }
    }
}

/// Resolves page image references through the backend port.
#[derive(Clone)]
pub struct PageAccessResolver {
    transport: Arc<dyn BackendTransport>,
}

impl PageAccessResolver {
    pub fn new(transport: Arc<dyn BackendTransport>) -> Self {
        Self { transport }
    }

    /// Resolves one page. Never fails: every outcome is a descriptor.
    pub async fn resolve_page(&self, book_id: &str, page_no: u32, mode: RenderMode) -> PageDescriptor {
        match self.fetch_page_url(book_id, page_no, mode).await {
            Ok(url) => PageDescriptor::allow(book_id, page_no, url),
            Err(denial) => {
                debug!(book_id, page_no, ?denial, "page not delivered");
                denial.into_descriptor(book_id, page_no)
            }
        }
    }

    async fn fetch_page_url(
        &self,
        book_id: &str,
        page_no: u32,
        mode: RenderMode,
    ) -> Result<String, PageDenial> {
        let payload = json!({
            "bookId": book_id,
            "pageNo": page_no,
            "webpType": mode.as_str(),
        });

        let reply = self
            .transport
            .send(WEBP_URL_PATH, Method::Post, Payload::Json(payload))
            .await
            .map_err(|e| {
                if e != PortError::Forbidden {
                    warn!(book_id, page_no, error = %e, "page url request failed");
                }
                PageDenial::from_port(e)
            })?;

        if !reply.flag {
            return Err(PageDenial::TrialLimit {
                message: reply.message,
            });
        }

        match reply.data {
            Some(Value::String(url)) if !url.is_empty() => Ok(url),
            _ => Err(PageDenial::Malformed),
        }
    }
}
