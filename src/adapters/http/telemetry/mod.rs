//! HTTP adapter for device and reading endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    DeviceResponse, ErrorResponse, ExposureQueryParams, ReadingResponse, ReadingsQueryParams,
    RegisterDeviceRequest,
};
pub use handlers::{RequireIdentity, TelemetryHandlers};
pub use routes::telemetry_routes;
