//! Telemetry domain - devices, noise readings and what gets broadcast about them.
//!
//! # Classification
//!
//! | Level (dB)        | Category   |
//! |-------------------|------------|
//! | `<= 70`           | `safe`     |
//! | `70 < l <= 85`    | `moderate` |
//! | `> 85`            | `harmful`  |

mod category;
mod device;
mod errors;
mod events;
mod exposure;
mod reading;

pub use category::{NoiseCategory, NoiseLevel, MODERATE_MAX_DB, SAFE_MAX_DB};
pub use device::{BatteryLevel, Device, DevicePatch, DEFAULT_BATTERY_LEVEL, DEFAULT_DEVICE_TYPE};
pub use errors::TelemetryError;
pub use events::{CanonicalEvent, DevicePresencePayload, DeviceStatusPayload, NoiseReadingPayload};
pub use exposure::{ExposureStats, MINUTES_PER_READING};
pub use reading::{TelemetryEvent, TimeRange, DEFAULT_LOCATION};
