//! Session lifecycle: credential mutation plus notifications to the embedding application.

use std::fmt;
use std::sync::Arc;

use tracing::{Level, event, info};

use crate::token::{CredentialStore, TokenPair};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The server rejected the access token outright.
    TokenRejected,
    /// The access token expired and the refresh call failed.
    RefreshFailed,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::TokenRejected => write!(f, "token_rejected"),
            InvalidationReason::RefreshFailed => write!(f, "refresh_failed"),
        }
    }
}

/// Notifications fired after the credential store has been updated. All methods default to
/// doing nothing. `redirect` is the configured logout redirect, if any.
pub trait SessionHooks: Send + Sync {
    fn on_invalid_token(&self, _redirect: Option<&str>) {}

    fn on_refresh_succeeded(&self, _tokens: &TokenPair) {}

    fn on_refresh_failed(&self, _redirect: Option<&str>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}

pub(crate) struct Session {
    store: Arc<dyn CredentialStore>,
    hooks: Arc<dyn SessionHooks>,
    redirect: Option<String>,
}

impl Session {
    pub(crate) fn new(
        store: Arc<dyn CredentialStore>,
        hooks: Arc<dyn SessionHooks>,
        redirect: Option<String>,
    ) -> Self {
        Self {
            store,
            hooks,
            redirect,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Stores a refreshed pair, keeping the current refresh token when the update lacks one.
    pub(crate) fn apply_refresh(&self, update: TokenPair) -> TokenPair {
        let tokens = self.store.tokens().merged(update);
        self.store.set_tokens(tokens.clone());
        tokens
    }

    pub(crate) fn refreshed(&self, tokens: &TokenPair) {
        info!("session refreshed");
        self.hooks.on_refresh_succeeded(tokens);
    }

    /// Clears the credential store and notifies the hooks.
    pub(crate) fn invalidate(&self, reason: InvalidationReason) {
        self.store.clear();
        event!(
            Level::WARN,
            reason = %reason,
            redirect = ?self.redirect,
            "session.invalidated"
        );
        let redirect = self.redirect.as_deref();
        match reason {
            InvalidationReason::TokenRejected => self.hooks.on_invalid_token(redirect),
            InvalidationReason::RefreshFailed => self.hooks.on_refresh_failed(redirect),
        }
    }
}
