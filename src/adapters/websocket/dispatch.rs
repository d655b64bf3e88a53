//! Inbound message dispatch for one connection.
//!
//! Every text frame goes through the same steps:
//!
//! 1. Identity guard (unbound connections are ignored)
//! 2. Parse into a [`ClientMessage`]
//! 3. Route to the matching application handler
//!
//! The return value is the reply for the originating connection only.
//! Room and global fan-out happen inside the handlers.

use std::sync::Arc;

use crate::application::handlers::telemetry::{DeviceUpdateHandler, DeviceUpdateOutcome};
use crate::domain::foundation::Timestamp;
use crate::domain::telemetry::TelemetryError;

use super::messages::{ClientMessage, ServerMessage};
use super::session_auth::{ConnectionContext, GuardOutcome, SessionAuthenticator};

/// Routes inbound frames to application handlers.
#[derive(Clone)]
pub struct InboundDispatcher {
    device_update: Arc<DeviceUpdateHandler>,
}

impl InboundDispatcher {
    pub fn new(device_update: Arc<DeviceUpdateHandler>) -> Self {
        Self { device_update }
    }

    /// Handle one text frame. Returns the direct reply, if any.
    pub async fn dispatch(&self, ctx: &ConnectionContext, text: &str) -> Option<ServerMessage> {
        let identity = match SessionAuthenticator::guard(ctx) {
            GuardOutcome::Admitted(identity) => identity,
            GuardOutcome::Rejected => return None,
        };

        let msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(client_id = %ctx.client_id, error = %e, "Malformed client message");
                return Some(ServerMessage::error(&TelemetryError::validation(
                    "message",
                    e.to_string(),
                )));
            }
        };

        match msg {
            ClientMessage::Ping => {
                tracing::trace!(client_id = %ctx.client_id, "Received ping");
                Some(ServerMessage::pong(Timestamp::now()))
            }
            ClientMessage::DeviceUpdate(request) => {
                match self.device_update.handle(identity, request).await {
                    Ok(DeviceUpdateOutcome::Patched(device)) => {
                        tracing::debug!(client_id = %ctx.client_id, device_id = %device.id(), "Device update applied");
                        None
                    }
                    Ok(DeviceUpdateOutcome::Ingested(outcome)) => {
                        tracing::debug!(client_id = %ctx.client_id, event_id = %outcome.event.id(), "Device update ingested");
                        None
                    }
                    Err(err) => {
                        match &err {
                            TelemetryError::PersistenceFailure(detail) => tracing::warn!(
                                client_id = %ctx.client_id,
                                identity = %identity,
                                error = %detail,
                                "Device update rolled back"
                            ),
                            other => tracing::debug!(
                                client_id = %ctx.client_id,
                                identity = %identity,
                                error = %other,
                                "Device update rejected"
                            ),
                        }
                        Some(ServerMessage::error(&err))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTelemetryStore;
    use crate::adapters::websocket::messages::ErrorMessage;
    use crate::adapters::websocket::rooms::ClientId;
    use crate::application::handlers::telemetry::test_support::{
        device_for, identity, RecordingBroadcaster,
    };
    use crate::application::handlers::telemetry::{ApplyDevicePatchHandler, IngestReadingHandler};
    use crate::ports::{NoiseReadingScope, TelemetryStore};

    fn dispatcher(store: &InMemoryTelemetryStore, broadcaster: &Arc<RecordingBroadcaster>) -> InboundDispatcher {
        let store: Arc<dyn TelemetryStore> = Arc::new(store.clone());
        let device_update = DeviceUpdateHandler::new(
            Arc::new(IngestReadingHandler::new(
                store.clone(),
                broadcaster.clone(),
                NoiseReadingScope::Global,
            )),
            Arc::new(ApplyDevicePatchHandler::new(store, broadcaster.clone())),
        );
        InboundDispatcher::new(Arc::new(device_update))
    }

    fn bound(id: &str) -> ConnectionContext {
        ConnectionContext::bound(ClientId::new(), identity(id))
    }

    #[tokio::test]
    async fn unbound_connection_is_ignored() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let frame = format!(r#"{{"type":"device_update","deviceId":"{}","noiseLevel":90}}"#, device.id());
        let reply = dispatcher(&store, &broadcaster)
            .dispatch(&ConnectionContext::unbound(ClientId::new()), &frame)
            .await;

        assert!(reply.is_none());
        assert_eq!(store.event_count(), 0);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        let reply = dispatcher(&store, &broadcaster).dispatch(&bound("u1"), r#"{"type":"ping"}"#).await;
        assert!(matches!(reply, Some(ServerMessage::Pong(_))));
    }

    #[tokio::test]
    async fn malformed_frame_gets_validation_error() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        let reply = dispatcher(&store, &broadcaster).dispatch(&bound("u1"), "{not json").await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error(ErrorMessage { ref code, .. })) if code == "VALIDATION_FAILED"
        ));
    }

    #[tokio::test]
    async fn successful_update_has_no_direct_reply() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let frame = format!(r#"{{"type":"device_update","deviceId":"{}","noiseLevel":90.0}}"#, device.id());
        let reply = dispatcher(&store, &broadcaster).dispatch(&bound("u1"), &frame).await;

        assert!(reply.is_none());
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn foreign_device_reports_not_found_to_sender() {
        let device = device_for("u2", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let frame = format!(r#"{{"type":"device_update","deviceId":"{}","batteryLevel":10}}"#, device.id());
        let reply = dispatcher(&store, &broadcaster).dispatch(&bound("u1"), &frame).await;

        assert!(matches!(
            reply,
            Some(ServerMessage::Error(ErrorMessage { ref code, .. })) if code == "DEVICE_NOT_FOUND"
        ));
        assert!(broadcaster.emitted().is_empty());
    }
}
