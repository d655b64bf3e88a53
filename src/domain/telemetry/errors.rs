//! Telemetry-specific error types.
//!
//! Every failure of an ingest or patch call is converted into one of these
//! and reported to the originating connection. None of them ends a connection.

use crate::domain::foundation::{DeviceId, DomainError, ErrorCode, ValidationError};

/// Telemetry-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The connection or message carries no bound identity.
    AuthenticationRequired,
    /// Malformed payload (missing or non-numeric field).
    ValidationFailed { field: String, message: String },
    /// The device does not exist or belongs to another identity.
    NotFound(DeviceId),
    /// The write or commit failed; the transaction was rolled back.
    PersistenceFailure(String),
}

impl TelemetryError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TelemetryError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: DeviceId) -> Self {
        TelemetryError::NotFound(id)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        TelemetryError::PersistenceFailure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TelemetryError::AuthenticationRequired => ErrorCode::Unauthorized,
            TelemetryError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            TelemetryError::NotFound(_) => ErrorCode::DeviceNotFound,
            TelemetryError::PersistenceFailure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Message safe to send back to the client.
    pub fn message(&self) -> String {
        match self {
            TelemetryError::AuthenticationRequired => "Authentication required".to_string(),
            TelemetryError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            TelemetryError::NotFound(id) => format!("Device not found: {}", id),
            TelemetryError::PersistenceFailure(_) => {
                "Could not save the update, please retry".to_string()
            }
        }
    }
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::PersistenceFailure(detail) => {
                write!(f, "Persistence failure: {}", detail)
            }
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for TelemetryError {}

impl From<ValidationError> for TelemetryError {
    fn from(err: ValidationError) -> Self {
        TelemetryError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for TelemetryError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => TelemetryError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::Unauthorized => TelemetryError::AuthenticationRequired,
            ErrorCode::DeviceNotFound => match err
                .details
                .get("device_id")
                .and_then(|id| id.parse::<DeviceId>().ok())
            {
                Some(id) => TelemetryError::NotFound(id),
                None => TelemetryError::PersistenceFailure(err.to_string()),
            },
            _ => TelemetryError::PersistenceFailure(err.to_string()),
        }
    }
}
