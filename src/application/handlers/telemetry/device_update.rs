//! DeviceUpdateHandler - Routes a raw `device_update` message.
//!
//! Without `noiseLevel` the update is a plain device patch. With it, the
//! reading and the patch are ingested together in one transaction.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::foundation::{DeviceId, IdentityId};
use crate::domain::telemetry::{BatteryLevel, Device, DevicePatch, TelemetryError};

use super::apply_device_patch::ApplyDevicePatchHandler;
use super::ingest_reading::{IngestOutcome, IngestReadingCommand, IngestReadingHandler};

/// `device_update` payload as received.
///
/// Numeric fields stay untyped here: clients send both JSON numbers and
/// numeric strings. Patchable fields are tri-state: absent (`None`),
/// explicit `null` (`Some(None)`), or a value. A `null` is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdateRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub battery_level: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub noise_level: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub is_connected: Option<Option<bool>>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Marks a key that is present in the payload, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Unwraps a tri-state field, rejecting an explicit `null`.
fn non_null<T>(field: &'static str, value: Option<Option<T>>) -> Result<Option<T>, TelemetryError> {
    match value {
        None => Ok(None),
        Some(Some(value)) => Ok(Some(value)),
        Some(None) => Err(TelemetryError::validation(field, "must not be null")),
    }
}

/// What a `device_update` turned into.
#[derive(Debug, Clone)]
pub enum DeviceUpdateOutcome {
    Patched(Device),
    Ingested(IngestOutcome),
}

/// Handler for `device_update` messages.
pub struct DeviceUpdateHandler {
    ingest: Arc<IngestReadingHandler>,
    patch: Arc<ApplyDevicePatchHandler>,
}

impl DeviceUpdateHandler {
    pub fn new(ingest: Arc<IngestReadingHandler>, patch: Arc<ApplyDevicePatchHandler>) -> Self {
        Self { ingest, patch }
    }

    pub async fn handle(
        &self,
        identity: &IdentityId,
        request: DeviceUpdateRequest,
    ) -> Result<DeviceUpdateOutcome, TelemetryError> {
        let device_id = parse_device_id(request.device_id.as_deref())?;
        let noise_level = non_null("noiseLevel", request.noise_level)?;
        let patch = DevicePatch {
            battery_level: non_null("batteryLevel", request.battery_level)?
                .as_ref()
                .map(parse_battery_level)
                .transpose()?,
            is_connected: non_null("isConnected", request.is_connected)?,
        };

        match noise_level.as_ref() {
            Some(raw) => {
                let raw_level = parse_noise_level(raw)?;
                let outcome = self
                    .ingest
                    .handle(
                        identity,
                        IngestReadingCommand {
                            device_id: Some(device_id),
                            raw_level,
                            location: request.location,
                            patch,
                        },
                    )
                    .await?;
                Ok(DeviceUpdateOutcome::Ingested(outcome))
            }
            None => {
                let device = self.patch.handle(identity, device_id, patch).await?;
                Ok(DeviceUpdateOutcome::Patched(device))
            }
        }
    }
}

fn parse_device_id(raw: Option<&str>) -> Result<DeviceId, TelemetryError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TelemetryError::validation("deviceId", "is required"))?;

    raw.parse()
        .map_err(|_| TelemetryError::validation("deviceId", format!("'{}' is not a valid device id", raw)))
}

fn parse_noise_level(raw: &Value) -> Result<f64, TelemetryError> {
    let level = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    level.ok_or_else(|| TelemetryError::validation("noiseLevel", "must be a number"))
}

fn parse_battery_level(raw: &Value) -> Result<BatteryLevel, TelemetryError> {
    let value = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| TelemetryError::validation("batteryLevel", "must be an integer"))?;

    Ok(BatteryLevel::try_new(value)?)
}
