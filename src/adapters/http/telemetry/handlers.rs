//! HTTP handlers for device and reading endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::websocket::SessionAuthenticator;
use crate::application::handlers::{
    DisconnectDeviceHandler, GetExposureStatsHandler, ListDevicesHandler, ListReadingsHandler,
    ListReadingsQuery, RegisterDeviceCommand, RegisterDeviceHandler,
};
use crate::domain::foundation::{AuthError, DeviceId, IdentityId, Timestamp};
use crate::domain::telemetry::{BatteryLevel, TelemetryError, TimeRange};

use super::dto::{
    DeviceResponse, ErrorResponse, ExposureQueryParams, ReadingResponse, ReadingsQueryParams,
    RegisterDeviceRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct TelemetryHandlers {
    authenticator: SessionAuthenticator,
    register_handler: Arc<RegisterDeviceHandler>,
    disconnect_handler: Arc<DisconnectDeviceHandler>,
    list_devices_handler: Arc<ListDevicesHandler>,
    list_readings_handler: Arc<ListReadingsHandler>,
    exposure_handler: Arc<GetExposureStatsHandler>,
}

impl TelemetryHandlers {
    pub fn new(
        authenticator: SessionAuthenticator,
        register_handler: Arc<RegisterDeviceHandler>,
        disconnect_handler: Arc<DisconnectDeviceHandler>,
        list_devices_handler: Arc<ListDevicesHandler>,
        list_readings_handler: Arc<ListReadingsHandler>,
        exposure_handler: Arc<GetExposureStatsHandler>,
    ) -> Self {
        Self {
            authenticator,
            register_handler,
            disconnect_handler,
            list_devices_handler,
            list_readings_handler,
            exposure_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Authentication
// ════════════════════════════════════════════════════════════════════════════

/// Identity admitted from the request's bearer token.
///
/// Goes through the same admission as the WebSocket upgrade, so the
/// identity is registered on first use.
#[derive(Debug, Clone)]
pub struct RequireIdentity(pub IdentityId);

#[async_trait]
impl FromRequestParts<TelemetryHandlers> for RequireIdentity {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TelemetryHandlers,
    ) -> Result<Self, Self::Rejection> {
        match state.authenticator.admit(&parts.headers, None).await {
            Ok(identity) => Ok(RequireIdentity(identity.id)),
            Err(AuthError::ServiceUnavailable(msg)) => {
                tracing::warn!(reason = %msg, "Identity check unavailable");
                Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse::service_unavailable("Authentication temporarily unavailable")),
                )
                    .into_response())
            }
            Err(e) => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::unauthorized(e.to_string())),
            )
                .into_response()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/devices - List the caller's devices
pub async fn list_devices(
    State(handlers): State<TelemetryHandlers>,
    RequireIdentity(identity): RequireIdentity,
) -> Response {
    match handlers.list_devices_handler.handle(&identity).await {
        Ok(devices) => {
            let response: Vec<DeviceResponse> = devices.iter().map(DeviceResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_telemetry_error(e),
    }
}

/// POST /api/devices - Register a device
pub async fn register_device(
    State(handlers): State<TelemetryHandlers>,
    RequireIdentity(identity): RequireIdentity,
    Json(req): Json<RegisterDeviceRequest>,
) -> Response {
    let battery_level = match req.battery_level.map(BatteryLevel::try_new).transpose() {
        Ok(level) => level,
        Err(e) => return handle_telemetry_error(e.into()),
    };

    let cmd = RegisterDeviceCommand {
        name: req.name,
        device_type: req.device_type,
        battery_level,
    };

    match handlers.register_handler.handle(&identity, cmd).await {
        Ok(device) => (StatusCode::CREATED, Json(DeviceResponse::from(&device))).into_response(),
        Err(e) => handle_telemetry_error(e),
    }
}

/// POST /api/devices/:id/disconnect - Mark a device disconnected
pub async fn disconnect_device(
    State(handlers): State<TelemetryHandlers>,
    RequireIdentity(identity): RequireIdentity,
    Path(device_id): Path<String>,
) -> Response {
    let device_id = match device_id.parse::<DeviceId>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid device ID")),
            )
                .into_response()
        }
    };

    match handlers.disconnect_handler.handle(&identity, device_id).await {
        Ok(device) => (StatusCode::OK, Json(DeviceResponse::from(&device))).into_response(),
        Err(e) => handle_telemetry_error(e),
    }
}

/// GET /api/readings - Reading history, newest first
pub async fn list_readings(
    State(handlers): State<TelemetryHandlers>,
    RequireIdentity(identity): RequireIdentity,
    Query(params): Query<ReadingsQueryParams>,
) -> Response {
    let range = match (params.start, params.end) {
        (None, None) => None,
        (Some(start), Some(end)) => {
            match TimeRange::new(Timestamp::from_datetime(start), Timestamp::from_datetime(end)) {
                Ok(range) => Some(range),
                Err(e) => return handle_telemetry_error(e.into()),
            }
        }
        _ => {
            return handle_telemetry_error(TelemetryError::validation(
                "range",
                "start and end must be given together",
            ))
        }
    };

    let query = ListReadingsQuery {
        range,
        limit: params.limit,
    };

    match handlers.list_readings_handler.handle(&identity, query).await {
        Ok(events) => {
            let response: Vec<ReadingResponse> = events.iter().map(ReadingResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_telemetry_error(e),
    }
}

/// GET /api/exposure - Minutes per tier for one UTC day
pub async fn exposure_stats(
    State(handlers): State<TelemetryHandlers>,
    RequireIdentity(identity): RequireIdentity,
    Query(params): Query<ExposureQueryParams>,
) -> Response {
    let day = params.date.unwrap_or_else(|| Timestamp::now().date());

    match handlers.exposure_handler.handle(&identity, day).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => handle_telemetry_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_telemetry_error(error: TelemetryError) -> Response {
    let status = match &error {
        TelemetryError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        TelemetryError::NotFound(_) => StatusCode::NOT_FOUND,
        TelemetryError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        TelemetryError::PersistenceFailure(detail) => {
            tracing::error!(error = %detail, "Telemetry request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ErrorResponse::from(&error))).into_response()
}
