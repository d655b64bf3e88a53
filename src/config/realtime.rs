//! Realtime fan-out configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::ports::NoiseReadingScope;

const MAX_CONNECTION_BUFFER: usize = 4096;
const MAX_SEND_TIMEOUT_MS: u64 = 30_000;

/// Per-connection queueing and broadcast scope
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound messages queued per connection before sends start waiting
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,

    /// How long a send may wait on a full queue before the message is dropped for that peer
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Audience of `noise_reading` events
    #[serde(default)]
    pub noise_reading_scope: NoiseReadingScope,
}

impl RealtimeConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connection_buffer == 0 || self.connection_buffer > MAX_CONNECTION_BUFFER {
            return Err(ValidationError::InvalidConnectionBuffer);
        }
        if self.send_timeout_ms == 0 || self.send_timeout_ms > MAX_SEND_TIMEOUT_MS {
            return Err(ValidationError::InvalidSendTimeout);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connection_buffer: default_connection_buffer(),
            send_timeout_ms: default_send_timeout_ms(),
            noise_reading_scope: NoiseReadingScope::default(),
        }
    }
}

fn default_connection_buffer() -> usize {
    64
}

fn default_send_timeout_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_broadcast_readings_globally() {
        let config = RealtimeConfig::default();
        assert_eq!(config.connection_buffer, 64);
        assert_eq!(config.send_timeout(), Duration::from_millis(500));
        assert_eq!(config.noise_reading_scope, NoiseReadingScope::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let config = RealtimeConfig {
            connection_buffer: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidConnectionBuffer));
    }

    #[test]
    fn send_timeout_bounds() {
        let zero = RealtimeConfig {
            send_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ValidationError::InvalidSendTimeout));

        let huge = RealtimeConfig {
            send_timeout_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(huge.validate(), Err(ValidationError::InvalidSendTimeout));
    }

    #[test]
    fn scope_deserializes_lowercase() {
        let config: RealtimeConfig =
            serde_json::from_str(r#"{ "noise_reading_scope": "room" }"#).unwrap();
        assert_eq!(config.noise_reading_scope, NoiseReadingScope::Room);
        assert_eq!(config.connection_buffer, 64);
    }
}
