//! Session token verification configuration

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::auth::JwtValidatorConfig;

/// Minimum HS256 secret length accepted in production.
const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Authentication configuration (HS256 session tokens)
#[derive(Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify token signatures
    pub jwt_secret: SecretString,

    /// Expected `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    #[serde(default)]
    pub audience: Option<String>,

    /// Clock skew tolerated on `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Build the validator settings for [`crate::adapters::auth::JwtSessionValidator`].
    pub fn validator_config(&self) -> JwtValidatorConfig {
        let mut config =
            JwtValidatorConfig::new(SecretString::new(self.jwt_secret.expose_secret().clone()));
        if let Some(issuer) = &self.issuer {
            config = config.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            config = config.with_audience(audience.clone());
        }
        config.leeway_secs = self.leeway_secs;
        config
    }

    /// Validate authentication configuration
    ///
    /// Production additionally requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_BYTES {
            return Err(ValidationError::WeakJwtSecret);
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new()),
            issuer: None,
            audience: None,
            leeway_secs: default_leeway(),
        }
    }
}

fn default_leeway() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(secret.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(
            AuthConfig::default().validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"))
        );
    }

    #[test]
    fn short_secret_is_fine_in_development() {
        assert!(with_secret("dev-secret").validate(&Environment::Development).is_ok());
    }

    #[test]
    fn short_secret_is_rejected_in_production() {
        assert_eq!(
            with_secret("dev-secret").validate(&Environment::Production),
            Err(ValidationError::WeakJwtSecret)
        );
        let strong = "k".repeat(MIN_PRODUCTION_SECRET_BYTES);
        assert!(with_secret(&strong).validate(&Environment::Production).is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let output = format!("{:?}", with_secret("super-secret-value"));
        assert!(!output.contains("super-secret-value"));
        assert!(output.contains("[REDACTED]"));
    }

    #[test]
    fn validator_config_carries_claims() {
        let config = AuthConfig {
            issuer: Some("noiseguard".to_string()),
            audience: Some("devices".to_string()),
            leeway_secs: 5,
            ..with_secret("dev-secret")
        };
        let validator = config.validator_config();
        assert_eq!(validator.issuer.as_deref(), Some("noiseguard"));
        assert_eq!(validator.audience.as_deref(), Some("devices"));
        assert_eq!(validator.leeway_secs, 5);
        assert_eq!(validator.secret.expose_secret(), "dev-secret");
    }
}
