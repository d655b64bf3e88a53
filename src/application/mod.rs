//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Identity is always passed in explicitly by the caller.

pub mod handlers;

pub use handlers::{
    ApplyDevicePatchHandler, DeviceUpdateHandler, DeviceUpdateOutcome, DeviceUpdateRequest,
    DisconnectDeviceHandler, GetExposureStatsHandler, IngestOutcome, IngestReadingCommand,
    IngestReadingHandler, ListDevicesHandler, ListReadingsHandler, ListReadingsQuery,
    RegisterDeviceCommand, RegisterDeviceHandler,
};
