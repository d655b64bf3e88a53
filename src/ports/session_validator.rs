//! Session validation port for identity tokens.
//!
//! The surrounding login flow issues a token; live connections present it
//! when they upgrade. This port turns that token into an identity. It is
//! provider-agnostic: the JWT adapter and the mock both implement it.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedIdentity};

/// Validates identity tokens and extracts the account they belong to.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate issuer, audience, and expiry claims where the token has them
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError>;
}
