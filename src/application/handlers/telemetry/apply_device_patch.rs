//! ApplyDevicePatchHandler - Partial battery/connectivity update of one device.

use std::sync::Arc;

use crate::domain::foundation::{DeviceId, IdentityId, Timestamp};
use crate::domain::telemetry::{CanonicalEvent, Device, DevicePatch, TelemetryError};
use crate::ports::{BroadcastTarget, TelemetryBroadcaster, TelemetryStore};

use super::abort;

/// Handler for device state patches.
pub struct ApplyDevicePatchHandler {
    store: Arc<dyn TelemetryStore>,
    broadcaster: Arc<dyn TelemetryBroadcaster>,
}

impl ApplyDevicePatchHandler {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        broadcaster: Arc<dyn TelemetryBroadcaster>,
    ) -> Self {
        Self { store, broadcaster }
    }

    /// Applies the fields present in `patch` and emits `device_status` to
    /// the owner's room once committed.
    pub async fn handle(
        &self,
        identity: &IdentityId,
        device_id: DeviceId,
        patch: DevicePatch,
    ) -> Result<Device, TelemetryError> {
        let now = Timestamp::now();
        let mut tx = self.store.begin().await?;

        let device = match tx.patch_device(&device_id, identity, &patch, now).await {
            Ok(Some(device)) => device,
            Ok(None) => return Err(abort(tx, TelemetryError::not_found(device_id)).await),
            Err(e) => return Err(abort(tx, e).await),
        };

        tx.commit().await.map_err(|e| {
            tracing::error!(identity = %identity, device_id = %device_id, error = %e, "Patch commit failed");
            TelemetryError::from(e)
        })?;

        tracing::debug!(identity = %identity, device_id = %device_id, "Device patched");

        self.broadcaster
            .emit(
                CanonicalEvent::device_status(&device, now),
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
    use crate::application::handlers::telemetry::test_support::{
        device_for, identity, RecordingBroadcaster,
    };
    use crate::domain::telemetry::BatteryLevel;

    fn handler(store: &InMemoryTelemetryStore, broadcaster: &Arc<RecordingBroadcaster>) -> ApplyDevicePatchHandler {
        ApplyDevicePatchHandler::new(Arc::new(store.clone()), broadcaster.clone())
    }

    #[tokio::test]
    async fn battery_only_patch_keeps_connectivity() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let updated = handler(&store, &broadcaster)
            .handle(&identity("u1"), *device.id(), DevicePatch::battery(BatteryLevel::try_new(30).unwrap()))
            .await
            .unwrap();

        assert_eq!(updated.battery_level().map(|b| b.value()), Some(30));
        assert_eq!(updated.is_connected(), device.is_connected());
        assert_eq!(store.device(device.id()).unwrap(), updated);
    }

    #[tokio::test]
    async fn connectivity_only_patch_keeps_battery() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let updated = handler(&store, &broadcaster)
            .handle(&identity("u1"), *device.id(), DevicePatch::connectivity(false))
            .await
            .unwrap();

        assert!(!updated.is_connected());
        assert_eq!(updated.battery_level(), device.battery_level());
    }

    #[tokio::test]
    async fn status_goes_to_owner_room() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        handler(&store, &broadcaster)
            .handle(&identity("u1"), *device.id(), DevicePatch::connectivity(false))
            .await
            .unwrap();

        let emitted = broadcaster.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].event.kind(), "device_status");
        assert_eq!(emitted[0].target, BroadcastTarget::Room(identity("u1")));
    }

    #[tokio::test]
    async fn foreign_device_is_not_found_and_untouched() {
        let device = device_for("u2", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster)
            .handle(&identity("u1"), *device.id(), DevicePatch::connectivity(false))
            .await
            .unwrap_err();

        assert_eq!(err, TelemetryError::NotFound(*device.id()));
        assert_eq!(store.device(device.id()).unwrap(), device);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_emits_nothing() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        store.set_commit_failure(true);
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster)
            .handle(&identity("u1"), *device.id(), DevicePatch::connectivity(false))
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::PersistenceFailure(_)));
        assert!(store.device(device.id()).unwrap().is_connected());
        assert!(broadcaster.emitted().is_empty());
    }
}
