//! services/client/src/reader.rs
//!
//! Wires the core components to one shared transport and session.

use crate::adapters::HttpTransport;
use crate::config::Config;
use crate::error::ClientError;
use crate::session::SessionContext;
use std::sync::Arc;
use triheart_core::ports::BackendTransport;
use triheart_core::{PageAccessResolver, PageAnnotationAggregator, ShelfService};

/// Shared reader state, created once at startup.
#[derive(Clone)]
pub struct ReaderApp {
    pub config: Arc<Config>,
    pub session: Arc<SessionContext>,
    pub pages: PageAccessResolver,
    pub annotations: PageAnnotationAggregator,
    pub shelf: ShelfService,
}

impl ReaderApp {
    /// Builds the HTTP transport from `config` and opens a session when a token
    /// is configured.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let session = match &config.token {
            Some(token) => SessionContext::signed_in(token.clone(), config.user_id.clone()),
            None => SessionContext::new(),
        };
        let transport = Arc::new(HttpTransport::from_config(&config, session.clone())?);
        Ok(Self::with_transport(Arc::new(config), session, transport))
    }

    pub fn with_transport(
        config: Arc<Config>,
        session: Arc<SessionContext>,
        transport: Arc<dyn BackendTransport>,
    ) -> Self {
        Self {
            config,
            session,
            pages: PageAccessResolver::new(transport.clone()),
            annotations: PageAnnotationAggregator::new(transport.clone()),
            shelf: ShelfService::new(transport),
        }
    }

    /// The signed-in user's id, required for shelf writes.
    pub fn user_id(&self) -> Result<String, ClientError> {
        self.session
            .current()
            .and_then(|s| s.user_id.clone())
            .ok_or_else(|| ClientError::Internal("no signed-in user (set TRIHEART_USER_ID)".to_string()))
    }
}
