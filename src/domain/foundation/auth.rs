//! Authentication types for the domain layer.
//!
//! These types represent an authenticated account extracted from an identity
//! token. They have no provider dependencies: any validator implementing the
//! `SessionValidator` port can populate them.

use super::IdentityId;
use thiserror::Error;

/// Account identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Stable account identifier.
    pub id: IdentityId,

    /// Email address from the token claims, when present.
    pub email: Option<String>,

    /// Display name if available (from `name` or `preferred_username`).
    pub display_name: Option<String>,
}

impl AuthenticatedIdentity {
    /// Creates a new authenticated identity.
    pub fn new(id: IdentityId, email: Option<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            email,
            display_name,
        }
    }

    /// Returns the display name, falling back to email and then the id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was presented.
    #[error("Authentication required")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication backend (validator or identity store) is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
