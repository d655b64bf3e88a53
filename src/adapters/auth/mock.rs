//! Mock session validator for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! use noiseguard::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new().with_test_identity("valid-token", "user-123");
//! let identity = validator.validate("valid-token").await?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedIdentity, IdentityId};
use crate::ports::SessionValidator;

/// Mock session validator.
///
/// Stores a map of tokens to identities. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedIdentity>>,
    /// Returned for every validation while set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to an identity.
    pub fn with_identity(self, token: impl Into<String>, identity: AuthenticatedIdentity) -> Self {
        self.add_token(token, identity);
        self
    }

    /// Adds a valid token for a generated identity with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `identity_id` is blank.
    pub fn with_test_identity(self, token: impl Into<String>, identity_id: impl Into<String>) -> Self {
        let identity_id = identity_id.into();
        let identity = AuthenticatedIdentity::new(
            IdentityId::new(&identity_id).expect("test identity id must not be blank"),
            Some(format!("{}@test.example.com", identity_id)),
            Some(format!("Test User {}", identity_id)),
        );
        self.with_identity(token, identity)
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        if let Ok(mut slot) = self.force_error.write() {
            *slot = Some(error);
        }
        self
    }

    pub fn clear_error(&self) {
        if let Ok(mut slot) = self.force_error.write() {
            *slot = None;
        }
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, identity: AuthenticatedIdentity) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), identity);
        }
    }

    /// Removes a token, making it invalid.
    pub fn remove_token(&self, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.remove(token);
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let forced = self
            .force_error
            .read()
            .map_err(|_| AuthError::service_unavailable("mock validator lock poisoned"))?
            .clone();
        if let Some(error) = forced {
            return Err(error);
        }

        self.tokens
            .read()
            .map_err(|_| AuthError::service_unavailable("mock validator lock poisoned"))?
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
