//! HTTP adapters - router assembly.
//!
//! Live updates go over the WebSocket upgraded at `/ws`. Device registration,
//! history and exposure queries are plain JSON under `/api`.

pub mod telemetry;

use std::time::Duration;

use axum::{http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

use self::telemetry::{telemetry_routes, TelemetryHandlers};

/// Build the application router.
///
/// `cors_origins` empty means any origin is allowed.
pub fn app_router(
    state: WebSocketState,
    telemetry: TelemetryHandlers,
    cors_origins: &[String],
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(websocket_router())
        .with_state(state)
        .nest("/api", telemetry_routes(telemetry))
        .layer(cors_layer(cors_origins))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
