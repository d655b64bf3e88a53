//! Canonical events emitted after a committed mutation.
//!
//! These are transport-independent: the WebSocket adapter wraps them in its
//! own envelope, but the payload shapes are fixed here.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::category::NoiseCategory;
use super::device::Device;
use super::reading::TelemetryEvent;

/// Payload of `device_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusPayload {
    pub device_id: String,
    pub battery_level: Option<u8>,
    pub is_connected: bool,
    pub last_update: String,
}

/// Payload of `device_connected` and `device_disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePresencePayload {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
}

/// Payload of `noise_reading`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseReadingPayload {
    pub id: String,
    pub noise_level: String,
    pub category: NoiseCategory,
    pub timestamp: String,
    pub location: String,
}

/// Normalized event produced by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalEvent {
    DeviceStatus(DeviceStatusPayload),
    DeviceConnected(DevicePresencePayload),
    DeviceDisconnected(DevicePresencePayload),
    NoiseReading(NoiseReadingPayload),
}

impl CanonicalEvent {
    /// Current state of a device after a patch.
    pub fn device_status(device: &Device, at: Timestamp) -> Self {
        CanonicalEvent::DeviceStatus(DeviceStatusPayload {
            device_id: device.id().to_string(),
            battery_level: device.battery_level().map(|b| b.value()),
            is_connected: device.is_connected(),
            last_update: at.to_rfc3339(),
        })
    }

    pub fn device_connected(device: &Device) -> Self {
        CanonicalEvent::DeviceConnected(presence(device))
    }

    pub fn device_disconnected(device: &Device) -> Self {
        CanonicalEvent::DeviceDisconnected(presence(device))
    }

    pub fn noise_reading(event: &TelemetryEvent) -> Self {
        CanonicalEvent::NoiseReading(NoiseReadingPayload {
            id: event.id().to_string(),
            noise_level: event.noise_level().to_wire_string(),
            category: event.category(),
            timestamp: event.recorded_at().to_rfc3339(),
            location: event.location().to_string(),
        })
    }

    /// Wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            CanonicalEvent::DeviceStatus(_) => "device_status",
            CanonicalEvent::DeviceConnected(_) => "device_connected",
            CanonicalEvent::DeviceDisconnected(_) => "device_disconnected",
            CanonicalEvent::NoiseReading(_) => "noise_reading",
        }
    }
}

fn presence(device: &Device) -> DevicePresencePayload {
    DevicePresencePayload {
        device_id: device.id().to_string(),
        device_name: device.name().to_string(),
        device_type: device.device_type().to_string(),
        battery_level: device.battery_level().map(|b| b.value()),
    }
}
