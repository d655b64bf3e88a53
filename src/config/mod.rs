//! Application configuration module
//!
//! Configuration is read from environment variables (and a `.env` file when
//! present) with the `NOISEGUARD` prefix. Nested values are separated by
//! double underscores.
//!
//! # Example
//!
//! ```no_run
//! use noiseguard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod realtime;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Listener, environment and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry store (PostgreSQL)
    pub database: DatabaseConfig,

    /// Session token verification
    pub auth: AuthConfig,

    /// Per-connection queues and broadcast scope
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `NOISEGUARD__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `NOISEGUARD__DATABASE__URL=...` -> `database.url = ...`
    /// - `NOISEGUARD__AUTH__JWT_SECRET=...` -> `auth.jwt_secret = ...`
    /// - `NOISEGUARD__REALTIME__NOISE_READING_SCOPE=room`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into their expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NOISEGUARD")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.realtime.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
