//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod telemetry;

pub use telemetry::{
    ApplyDevicePatchHandler, DeviceUpdateHandler, DeviceUpdateOutcome, DeviceUpdateRequest,
    DisconnectDeviceHandler, GetExposureStatsHandler, IngestOutcome, IngestReadingCommand,
    IngestReadingHandler, ListDevicesHandler, ListReadingsHandler, ListReadingsQuery,
    RegisterDeviceCommand, RegisterDeviceHandler,
};
