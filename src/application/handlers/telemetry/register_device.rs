//! RegisterDeviceHandler - Pairs a new device with an identity.

use std::sync::Arc;

use crate::domain::foundation::{IdentityId, Timestamp};
use crate::domain::telemetry::{BatteryLevel, CanonicalEvent, Device, TelemetryError};
use crate::ports::{BroadcastTarget, TelemetryBroadcaster, TelemetryStore};

use super::abort;

/// Command to register a device.
#[derive(Debug, Clone)]
pub struct RegisterDeviceCommand {
    pub name: String,
    /// Defaults to `earbuds`.
    pub device_type: Option<String>,
    /// Defaults to full charge.
    pub battery_level: Option<BatteryLevel>,
}

/// Handler for registering devices.
pub struct RegisterDeviceHandler {
    store: Arc<dyn TelemetryStore>,
    broadcaster: Arc<dyn TelemetryBroadcaster>,
}

impl RegisterDeviceHandler {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        broadcaster: Arc<dyn TelemetryBroadcaster>,
    ) -> Self {
        Self { store, broadcaster }
    }

    pub async fn handle(
        &self,
        identity: &IdentityId,
        cmd: RegisterDeviceCommand,
    ) -> Result<Device, TelemetryError> {
        let device = Device::register(
            identity.clone(),
            cmd.name,
            cmd.device_type,
            cmd.battery_level,
            Timestamp::now(),
        )?;

        let mut tx = self.store.begin().await?;
        if let Err(e) = tx.create_device(&device).await {
            return Err(abort(tx, e).await);
        }
        tx.commit().await?;

        tracing::info!(
            identity = %identity,
            device_id = %device.id(),
            device_type = device.device_type(),
            "Device registered"
        );

        self.broadcaster
            .emit(
                CanonicalEvent::device_connected(&device),
                BroadcastTarget::Room(identity.clone()),
            )
            .await;

        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTelemetryStore;
    use crate::application::handlers::telemetry::test_support::{identity, RecordingBroadcaster};
    use crate::domain::telemetry::{DEFAULT_BATTERY_LEVEL, DEFAULT_DEVICE_TYPE};

    fn command(name: &str) -> RegisterDeviceCommand {
        RegisterDeviceCommand {
            name: name.to_string(),
            device_type: None,
            battery_level: None,
        }
    }

    #[tokio::test]
    async fn registers_connected_device_with_defaults() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);
        let handler = RegisterDeviceHandler::new(Arc::new(store.clone()), broadcaster.clone());

        let device = handler.handle(&identity("u1"), command("Studio buds")).await.unwrap();

        assert!(device.is_connected());
        assert_eq!(device.device_type(), DEFAULT_DEVICE_TYPE);
        assert_eq!(device.battery_level().map(|b| b.value()), Some(DEFAULT_BATTERY_LEVEL));
        assert_eq!(store.device(device.id()), Some(device.clone()));
        assert_eq!(broadcaster.kinds(), vec!["device_connected"]);
        assert_eq!(broadcaster.emitted()[0].target, BroadcastTarget::Room(identity("u1")));
    }

    #[tokio::test]
    async fn blank_name_is_a_validation_error() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);
        let handler = RegisterDeviceHandler::new(Arc::new(store.clone()), broadcaster.clone());

        let err = handler.handle(&identity("u1"), command("   ")).await.unwrap_err();

        assert!(matches!(err, TelemetryError::ValidationFailed { .. }));
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_registers_nothing() {
        let store = InMemoryTelemetryStore::new();
        store.set_commit_failure(true);
        let broadcaster = RecordingBroadcaster::new(&store);
        let handler = RegisterDeviceHandler::new(Arc::new(store.clone()), broadcaster.clone());

        let err = handler.handle(&identity("u1"), command("Buds")).await.unwrap_err();

        assert!(matches!(err, TelemetryError::PersistenceFailure(_)));
        assert!(store.find_devices_by_owner(&identity("u1")).await.unwrap().is_empty());
        assert!(broadcaster.emitted().is_empty());
    }
}
