//! HTTP DTOs for device and reading endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::telemetry::{Device, NoiseCategory, TelemetryError, TelemetryEvent};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to register a device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub name: String,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub battery_level: Option<i64>,
}

/// Query parameters for reading history.
///
/// `start` and `end` bound the window together; either alone is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingsQueryParams {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Query parameters for exposure statistics. Defaults to today (UTC).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExposureQueryParams {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub battery_level: Option<u8>,
    pub is_connected: bool,
    pub last_connected: String,
    pub created_at: String,
}

impl From<&Device> for DeviceResponse {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id().to_string(),
            name: device.name().to_string(),
            device_type: device.device_type().to_string(),
            battery_level: device.battery_level().map(|b| b.value()),
            is_connected: device.is_connected(),
            last_connected: device.last_connected().to_rfc3339(),
            created_at: device.created_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Decimal string, as on the live channel.
    pub noise_level: String,
    pub category: NoiseCategory,
    pub timestamp: String,
    pub location: String,
}

impl From<&TelemetryEvent> for ReadingResponse {
    fn from(event: &TelemetryEvent) -> Self {
        Self {
            id: event.id().to_string(),
            device_id: event.device_id().map(|id| id.to_string()),
            noise_level: event.noise_level().to_wire_string(),
            category: event.category(),
            timestamp: event.recorded_at().to_rfc3339(),
            location: event.location().to_string(),
        }
    }
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            code: "UNAUTHORIZED".to_string(),
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            code: "SERVICE_UNAVAILABLE".to_string(),
            message: message.into(),
        }
    }
}

impl From<&TelemetryError> for ErrorResponse {
    fn from(err: &TelemetryError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}
