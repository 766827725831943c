//! crates/triheart_core/src/ports.rs
//!
//! Defines the single request capability the core consumes.
//! The core never owns transport, auth headers or base URLs; an adapter outside
//! this crate implements `BackendTransport` and the components here only ever
//! talk to the backend through it.

use async_trait::async_trait;
use serde_json::Value;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Every way a backend call can fail before a reply envelope reaches the core.
///
/// A reply that *does* arrive with `flag = false` is not an error at this level;
/// it is an ordinary `BackendReply` and each component decides what it means.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// No HTTP response was obtained (connection refused, DNS, timeout).
    #[error("Backend unreachable: {0}")]
    Unreachable(String),
    /// The transport answered with HTTP 403.
    #[error("Forbidden")]
    Forbidden,
    #[error("Unauthorized")]
    Unauthorized,
    /// Any other non-success HTTP status.
    #[error("Backend answered with HTTP status {0}")]
    Status(u16),
    /// A response arrived but its body is not a reply envelope.
    #[error("Malformed reply: {0}")]
    Malformed(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request / Reply Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
}

/// The body of a backend request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs; keys may repeat.
    Form(Vec<(String, String)>),
}

impl Payload {
    /// Builds a form payload from borrowed pairs.
    pub fn form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Payload::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// A reply envelope from a successful transport round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    /// Application-level success indicator, independent of the HTTP status.
    pub flag: bool,
    pub data: Option<Value>,
    pub message: Option<String>,
    pub http_status: u16,
}

impl BackendReply {
    /// A `flag = true` reply carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            flag: true,
            data: Some(data),
            message: None,
            http_status: 200,
        }
    }

    /// A `flag = false` reply with an optional message.
    pub fn denied(message: Option<&str>) -> Self {
        Self {
            flag: false,
            data: None,
            message: message.map(str::to_string),
            http_status: 200,
        }
    }

    /// Returns `data` only when the business flag is set and the payload is not null.
    pub fn into_data(self) -> Option<Value> {
        if !self.flag {
            return None;
        }
        self.data.filter(|v| !v.is_null())
    }
}

//=========================================================================================
// Service Port (Trait)
//=========================================================================================

#[async_trait]
pub trait BackendTransport: Send + Sync {
    /// Sends one request to `path` (relative to the API prefix) and returns the
    /// decoded reply envelope.
    async fn send(&self, path: &str, method: Method, payload: Payload) -> PortResult<BackendReply>;
}
