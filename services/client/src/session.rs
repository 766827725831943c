//! services/client/src/session.rs
//!
//! The explicit session context handed to the transport at construction.
//!
//! A `Session` is immutable once created. Signing in swaps in a new one and
//! signing out clears it; a request works from the snapshot it took when it
//! started, so neither can change the headers of a request already in flight.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Credentials of one signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a context that is already signed in.
    pub fn signed_in(token: impl Into<String>, user_id: Option<String>) -> Arc<Self> {
        let context = Self::new();
        context.sign_in(token, user_id);
        context
    }

    pub fn sign_in(&self, token: impl Into<String>, user_id: Option<String>) {
        let session = Session {
            token: token.into(),
            user_id,
        };
        info!(user_id = ?session.user_id, "session opened");
        *self.current.write() = Some(Arc::new(session));
    }

    pub fn sign_out(&self) {
        if self.current.write().take().is_some() {
            info!("session closed");
        }
    }

    /// A snapshot of the current session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().is_some()
    }
}
