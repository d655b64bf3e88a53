//! HTTP routes for device and reading endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    disconnect_device, exposure_stats, list_devices, list_readings, register_device,
    TelemetryHandlers,
};

/// Creates the telemetry router. Mounted under `/api`.
pub fn telemetry_routes(handlers: TelemetryHandlers) -> Router {
    Router::new()
        .route("/devices", get(list_devices).post(register_device))
        .route("/devices/:id/disconnect", post(disconnect_device))
        .route("/readings", get(list_readings))
        .route("/exposure", get(exposure_stats))
        .with_state(handlers)
}
