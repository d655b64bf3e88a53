//! Session authentication for live connections.
//!
//! Admission happens once, at upgrade time:
//!
//! ```text
//! Upgrade request → token (header, then ?token=) → SessionValidator
//!                                                       ↓
//!                                     TelemetryStore::ensure_identity
//!                                                       ↓
//!                                          ConnectionContext { identity }
//! ```
//!
//! After that, every inbound message passes [`SessionAuthenticator::guard`]
//! before anything else looks at it.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::domain::foundation::{AuthError, AuthenticatedIdentity, IdentityId};
use crate::ports::{SessionValidator, TelemetryStore};

use super::rooms::ClientId;

/// Per-connection state carried through the message loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub client_id: ClientId,
    identity: Option<IdentityId>,
}

impl ConnectionContext {
    /// Context for an admitted connection.
    pub fn bound(client_id: ClientId, identity: IdentityId) -> Self {
        Self {
            client_id,
            identity: Some(identity),
        }
    }

    /// Context for a connection with no identity.
    pub fn unbound(client_id: ClientId) -> Self {
        Self {
            client_id,
            identity: None,
        }
    }

    pub fn identity(&self) -> Option<&IdentityId> {
        self.identity.as_ref()
    }
}

/// Result of the per-message guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<'a> {
    Admitted(&'a IdentityId),
    Rejected,
}

/// Admits connections and guards their messages.
#[derive(Clone)]
pub struct SessionAuthenticator {
    validator: Arc<dyn SessionValidator>,
    store: Arc<dyn TelemetryStore>,
}

impl SessionAuthenticator {
    pub fn new(validator: Arc<dyn SessionValidator>, store: Arc<dyn TelemetryStore>) -> Self {
        Self { validator, store }
    }

    /// Authenticate an upgrade request.
    ///
    /// The `Authorization: Bearer` header wins over the `token` query
    /// parameter. A first-seen identity is recorded in the store.
    ///
    /// # Errors
    ///
    /// - `MissingToken` if neither source carries a token
    /// - `InvalidToken` / `TokenExpired` from the validator
    /// - `ServiceUnavailable` if the validator or the store is down
    pub async fn admit(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = bearer_token(headers)
            .or_else(|| query_token.map(str::trim).filter(|t| !t.is_empty()))
            .ok_or(AuthError::MissingToken)?;

        let identity = self.validator.validate(token).await?;

        match self.store.ensure_identity(&identity).await {
            Ok(true) => tracing::info!(identity = %identity.id, "First connection for identity"),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(identity = %identity.id, error = %e, "Failed to record identity");
                return Err(AuthError::service_unavailable("identity store unavailable"));
            }
        }

        Ok(identity)
    }

    /// Guard run first in every inbound-message handler.
    pub fn guard(ctx: &ConnectionContext) -> GuardOutcome<'_> {
        match ctx.identity() {
            Some(identity) => GuardOutcome::Admitted(identity),
            None => {
                tracing::debug!(client_id = %ctx.client_id, "Dropping message from unbound connection");
                GuardOutcome::Rejected
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
