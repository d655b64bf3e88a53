//! Telemetry command and query handlers.
//!
//! Every mutating handler follows the same shape:
//!
//! 1. Validate input, build domain values
//! 2. Open one transaction, apply all writes, commit
//! 3. Only after a successful commit, emit canonical events
//!
//! Any failure in step 2 rolls the whole transaction back and nothing is
//! emitted.

mod apply_device_patch;
mod device_update;
mod disconnect_device;
mod exposure_stats;
mod ingest_reading;
mod list_devices;
mod list_readings;
mod register_device;

pub use apply_device_patch::ApplyDevicePatchHandler;
pub use device_update::{DeviceUpdateHandler, DeviceUpdateOutcome, DeviceUpdateRequest};
pub use disconnect_device::DisconnectDeviceHandler;
pub use exposure_stats::GetExposureStatsHandler;
pub use ingest_reading::{IngestOutcome, IngestReadingCommand, IngestReadingHandler};
pub use list_devices::ListDevicesHandler;
pub use list_readings::{
    ListReadingsHandler, ListReadingsQuery, DEFAULT_READINGS_LIMIT, MAX_READINGS_LIMIT,
};
pub use register_device::{RegisterDeviceCommand, RegisterDeviceHandler};

use crate::domain::telemetry::TelemetryError;
use crate::ports::TelemetryTransaction;

/// Roll back `tx` and hand back the error that caused it.
async fn abort(tx: Box<dyn TelemetryTransaction>, err: impl Into<TelemetryError>) -> TelemetryError {
    let err = err.into();
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "Rollback failed");
    }
    err
}
