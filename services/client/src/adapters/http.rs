//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the TriHeart backend.
//! It implements the `BackendTransport` port from the `core` crate with `reqwest`.

use crate::config::Config;
use crate::session::SessionContext;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use triheart_core::ports::{BackendReply, BackendTransport, Method, Payload, PortError, PortResult};

//=========================================================================================
// Wire Envelope
//=========================================================================================

/// The `{flag, data, message, code}` envelope every backend endpoint answers with.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    flag: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `BackendTransport` over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_prefix: String,
    session: Arc<SessionContext>,
}

impl HttpTransport {
    /// Creates a new `HttpTransport`. `api_prefix` is either empty or starts with `/`.
    pub fn new(client: Client, base_url: Url, api_prefix: String, session: Arc<SessionContext>) -> Self {
        Self {
            client,
            base_url,
            api_prefix,
            session,
        }
    }

    /// Builds a transport with its own client, using the configured timeout.
    pub fn from_config(config: &Config, session: Arc<SessionContext>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::new(
            client,
            config.base_url.clone(),
            config.api_prefix.clone(),
            session,
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_prefix,
            path.trim_start_matches('/')
        )
    }
}

//=========================================================================================
// `BackendTransport` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendTransport for HttpTransport {
    async fn send(&self, path: &str, method: Method, payload: Payload) -> PortResult<BackendReply> {
        // One snapshot per request; a sign-out mid-flight does not touch it.
        let session = self.session.current();
        let url = self.endpoint(path);

        let mut request = match method {
            Method::Post => self.client.post(&url),
        };
        if let Some(session) = &session {
            request = request.bearer_auth(&session.token);
        }
        request = match &payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::Form(pairs) => request.form(pairs),
        };

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unreachable(e.to_string()))?;

        let status = response.status();
        debug!(?method, path, status = status.as_u16(), "backend call");

        match status {
            StatusCode::FORBIDDEN => return Err(PortError::Forbidden),
            StatusCode::UNAUTHORIZED => return Err(PortError::Unauthorized),
            s if !s.is_success() => return Err(PortError::Status(s.as_u16())),
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Unreachable(e.to_string()))?;
        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(|e| PortError::Malformed(e.to_string()))?;

        Ok(BackendReply {
            flag: envelope.flag,
            data: envelope.data,
            message: envelope.message,
            http_status: status.as_u16(),
        })
    }
}
