//! HS256 JWT adapter for session validation.
//!
//! The login flow signs session tokens with a shared secret. This adapter
//! verifies them and maps the claims to an [`AuthenticatedIdentity`]:
//!
//! 1. Verify the HMAC signature against the configured secret
//! 2. Validate expiry, and issuer/audience when configured
//! 3. Map `sub` to the identity id, `email` and `name` to profile fields

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedIdentity, IdentityId};
use crate::ports::SessionValidator;

/// Configuration for the JWT validator.
pub struct JwtValidatorConfig {
    /// Shared HMAC secret.
    pub secret: SecretString,

    /// Expected `iss` claim. Not checked when `None`.
    pub issuer: Option<String>,

    /// Expected `aud` claim. Not checked when `None`.
    pub audience: Option<String>,

    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

impl JwtValidatorConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: None,
            audience: None,
            leeway_secs: 30,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// Session token claims.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Subject - the identity id
    sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    exp: i64,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    preferred_username: Option<String>,
}

/// Production implementation of `SessionValidator`.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtSessionValidator {
    pub fn new(config: JwtValidatorConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;

        match &config.issuer {
            Some(issuer) => {
                validation.set_issuer(&[issuer]);
                validation.set_required_spec_claims(&["exp", "sub", "iss"]);
            }
            None => validation.set_required_spec_claims(&["exp", "sub"]),
        }

        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            validation,
            issuer: config.issuer,
            audience: config.audience,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                        tracing::warn!(error = %e, "Token issued for another party");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!(error = %e, "Token validation failed");
                        AuthError::InvalidToken
                    }
                }
            })?;
        let claims = token_data.claims;

        let id = IdentityId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Token carries a blank subject");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedIdentity::new(
            id,
            claims.email,
            claims.name.or(claims.preferred_username),
        ))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret-with-enough-entropy";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(
            JwtValidatorConfig::new(SecretString::new(SECRET.to_string()))
                .with_issuer("noiseguard-auth")
                .with_audience("noiseguard-realtime"),
        )
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "sub": "user-42",
            "iss": "noiseguard-auth",
            "aud": "noiseguard-realtime",
            "exp": chrono::Utc::now().timestamp() + 3600,
            "email": "listener@example.com",
            "name": "Listener",
        })
    }

    #[tokio::test]
    async fn valid_token_maps_claims() {
        let identity = validator().validate(&sign(valid_claims(), SECRET)).await.unwrap();
        assert_eq!(identity.id.as_str(), "user-42");
        assert_eq!(identity.email.as_deref(), Some("listener@example.com"));
        assert_eq!(identity.display_name.as_deref(), Some("Listener"));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let token = sign(valid_claims(), "some-other-secret");
        assert_eq!(validator().validate(&token).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let mut claims = valid_claims();
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 3600);
        assert_eq!(
            validator().validate(&sign(claims, SECRET)).await,
            Err(AuthError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid() {
        let mut claims = valid_claims();
        claims["aud"] = json!("someone-else");
        assert_eq!(
            validator().validate(&sign(claims, SECRET)).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(validator().validate("not-a-jwt").await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn issuer_and_audience_optional_when_unconfigured() {
        let validator =
            JwtSessionValidator::new(JwtValidatorConfig::new(SecretString::new(SECRET.to_string())));
        let token = sign(
            json!({ "sub": "user-7", "exp": chrono::Utc::now().timestamp() + 60 }),
            SECRET,
        );
        let identity = validator.validate(&token).await.unwrap();
        assert_eq!(identity.id.as_str(), "user-7");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn debug_does_not_expose_secret() {
        let debug = format!("{:?}", validator());
        assert!(!debug.contains(SECRET));
    }
}
