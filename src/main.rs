//! NoiseGuard server binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use noiseguard::adapters::auth::JwtSessionValidator;
use noiseguard::adapters::http::app_router;
use noiseguard::adapters::http::telemetry::TelemetryHandlers;
use noiseguard::adapters::postgres::PostgresTelemetryStore;
use noiseguard::adapters::websocket::{
    InboundDispatcher, RoomBroadcaster, RoomManager, SessionAuthenticator, WebSocketState,
};
use noiseguard::application::handlers::{
    ApplyDevicePatchHandler, DeviceUpdateHandler, DisconnectDeviceHandler,
    GetExposureStatsHandler, IngestReadingHandler, ListDevicesHandler, ListReadingsHandler,
    RegisterDeviceHandler,
};
use noiseguard::config::AppConfig;
use noiseguard::ports::{NoiseReadingScope, SessionValidator, TelemetryBroadcaster, TelemetryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let scope = config.realtime.noise_reading_scope;
    if scope == NoiseReadingScope::Global {
        tracing::warn!(
            "noise_reading events are broadcast to every connection; \
             set NOISEGUARD__REALTIME__NOISE_READING_SCOPE=room to confine them"
        );
    }

    let store: Arc<dyn TelemetryStore> = Arc::new(PostgresTelemetryStore::new(pool));
    let room_manager = Arc::new(RoomManager::new());
    let broadcaster: Arc<dyn TelemetryBroadcaster> = Arc::new(RoomBroadcaster::new(
        room_manager.clone(),
        config.realtime.send_timeout(),
    ));

    let ingest = Arc::new(IngestReadingHandler::new(store.clone(), broadcaster.clone(), scope));
    let patch = Arc::new(ApplyDevicePatchHandler::new(store.clone(), broadcaster.clone()));
    let dispatcher = InboundDispatcher::new(Arc::new(DeviceUpdateHandler::new(ingest, patch)));

    let validator: Arc<dyn SessionValidator> =
        Arc::new(JwtSessionValidator::new(config.auth.validator_config()));
    let authenticator = SessionAuthenticator::new(validator, store.clone());

    let telemetry = TelemetryHandlers::new(
        authenticator.clone(),
        Arc::new(RegisterDeviceHandler::new(store.clone(), broadcaster.clone())),
        Arc::new(DisconnectDeviceHandler::new(store.clone(), broadcaster)),
        Arc::new(ListDevicesHandler::new(store.clone())),
        Arc::new(ListReadingsHandler::new(store.clone())),
        Arc::new(GetExposureStatsHandler::new(store)),
    );

    let state = WebSocketState::new(
        authenticator,
        room_manager,
        dispatcher,
        config.realtime.connection_buffer,
        config.realtime.send_timeout(),
    );
    let app = app_router(
        state,
        telemetry,
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "NoiseGuard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("NoiseGuard stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
