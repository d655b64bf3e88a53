//! IngestReadingHandler - Records a noise reading and the device state that came with it.

use std::sync::Arc;

use crate::domain::foundation::{DeviceId, IdentityId, Timestamp};
use crate::domain::telemetry::{
    CanonicalEvent, Device, DevicePatch, NoiseLevel, TelemetryError, TelemetryEvent,
};
use crate::ports::{BroadcastTarget, NoiseReadingScope, TelemetryBroadcaster, TelemetryStore};

use super::abort;

/// Command to ingest one noise reading.
#[derive(Debug, Clone, Default)]
pub struct IngestReadingCommand {
    /// Device that produced the reading. Required when `patch` is non-empty.
    pub device_id: Option<DeviceId>,
    /// Level in dB as received; must be finite.
    pub raw_level: f64,
    pub location: Option<String>,
    /// Battery/connectivity change reported with the reading.
    pub patch: DevicePatch,
}

/// Result of a committed ingest.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub event: TelemetryEvent,
    /// State of the device after the patch, if a device was given.
    pub device: Option<Device>,
}

/// Handler for ingesting noise readings.
pub struct IngestReadingHandler {
    store: Arc<dyn TelemetryStore>,
    broadcaster: Arc<dyn TelemetryBroadcaster>,
    noise_scope: NoiseReadingScope,
}

impl IngestReadingHandler {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        broadcaster: Arc<dyn TelemetryBroadcaster>,
        noise_scope: NoiseReadingScope,
    ) -> Self {
        Self {
            store,
            broadcaster,
            noise_scope,
        }
    }

    pub async fn handle(
        &self,
        identity: &IdentityId,
        cmd: IngestReadingCommand,
    ) -> Result<IngestOutcome, TelemetryError> {
        // 1. Validate and classify
        let level = NoiseLevel::new(cmd.raw_level)?;
        if cmd.device_id.is_none() && !cmd.patch.is_empty() {
            return Err(TelemetryError::validation(
                "deviceId",
                "required when reporting device state",
            ));
        }

        let now = Timestamp::now();
        let event = TelemetryEvent::record(identity.clone(), cmd.device_id, level, cmd.location, now);

        // 2. Patch the device and write the event in one transaction
        let mut tx = self.store.begin().await?;

        let device = match cmd.device_id {
            Some(id) => match tx.patch_device(&id, identity, &cmd.patch, now).await {
                Ok(Some(device)) => Some(device),
                Ok(None) => return Err(abort(tx, TelemetryError::not_found(id)).await),
                Err(e) => return Err(abort(tx, e).await),
            },
            None => None,
        };

        if let Err(e) = tx.create_event(&event).await {
            return Err(abort(tx, e).await);
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(identity = %identity, error = %e, "Ingest commit failed");
            TelemetryError::from(e)
        })?;

        tracing::info!(
            identity = %identity,
            event_id = %event.id(),
            level = %event.noise_level(),
            category = %event.category(),
            "Reading ingested"
        );

        // 3. Emit after commit
        if let Some(device) = &device {
            self.broadcaster
                .emit(
                    CanonicalEvent::device_status(device, now),
                    BroadcastTarget::Room(identity.clone()),
                )
                .await;
        }

        if let Some(target) = self.noise_scope.target_for(identity) {
            self.broadcaster
                .emit(CanonicalEvent::noise_reading(&event), target)
                .await;
        }

        Ok(IngestOutcome { event, device })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTelemetryStore;
    use crate::application::handlers::telemetry::test_support::{
        device_for, identity, RecordingBroadcaster,
    };
    use crate::domain::telemetry::{BatteryLevel, NoiseCategory};

    fn handler(
        store: &InMemoryTelemetryStore,
        broadcaster: &Arc<RecordingBroadcaster>,
        scope: NoiseReadingScope,
    ) -> IngestReadingHandler {
        IngestReadingHandler::new(Arc::new(store.clone()), broadcaster.clone(), scope)
    }

    #[tokio::test]
    async fn harmful_reading_is_persisted_and_broadcast() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let outcome = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(
                &identity("u1"),
                IngestReadingCommand {
                    device_id: Some(*device.id()),
                    raw_level: 90.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.event.category(), NoiseCategory::Harmful);
        assert_eq!(store.event_count(), 1);

        let emitted = broadcaster.emitted();
        assert_eq!(broadcaster.kinds(), vec!["device_status", "noise_reading"]);
        assert_eq!(emitted[0].target, BroadcastTarget::Room(identity("u1")));
        assert_eq!(emitted[1].target, BroadcastTarget::All);
    }

    #[tokio::test]
    async fn emission_happens_after_commit() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(&identity("u1"), IngestReadingCommand { raw_level: 50.0, ..Default::default() })
            .await
            .unwrap();

        assert!(broadcaster.emitted().iter().all(|e| e.committed_events == 1));
    }

    #[tokio::test]
    async fn non_finite_level_is_rejected_without_side_effects() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(&identity("u1"), IngestReadingCommand { raw_level: f64::NAN, ..Default::default() })
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::ValidationFailed { ref field, .. } if field == "noiseLevel"));
        assert_eq!(store.event_count(), 0);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn foreign_device_is_not_found() {
        let device = device_for("u2", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(
                &identity("u1"),
                IngestReadingCommand {
                    device_id: Some(*device.id()),
                    raw_level: 60.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err, TelemetryError::NotFound(*device.id()));
        assert_eq!(store.event_count(), 0);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_leaves_no_trace() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        store.set_commit_failure(true);
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(
                &identity("u1"),
                IngestReadingCommand {
                    device_id: Some(*device.id()),
                    raw_level: 95.0,
                    patch: DevicePatch::battery(BatteryLevel::try_new(5).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::PersistenceFailure(_)));
        assert_eq!(store.event_count(), 0);
        assert_eq!(store.device(device.id()).unwrap(), device);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_rolls_back_every_field_combination() {
        let battery = BatteryLevel::try_new(5).unwrap();
        let patches = [
            DevicePatch::default(),
            DevicePatch::connectivity(false),
            DevicePatch::battery(battery),
            DevicePatch {
                battery_level: Some(battery),
                is_connected: Some(false),
            },
        ];

        for patch in patches {
            let device = device_for("u1", 80);
            let store = InMemoryTelemetryStore::new().with_device(device.clone());
            store.set_commit_failure(true);
            let broadcaster = RecordingBroadcaster::new(&store);

            let err = handler(&store, &broadcaster, NoiseReadingScope::Global)
                .handle(
                    &identity("u1"),
                    IngestReadingCommand {
                        device_id: Some(*device.id()),
                        raw_level: 88.0,
                        location: Some("Workshop".to_string()),
                        patch,
                    },
                )
                .await
                .unwrap_err();

            assert!(matches!(err, TelemetryError::PersistenceFailure(_)), "{:?}", patch);
            assert_eq!(store.event_count(), 0, "{:?}", patch);
            assert_eq!(store.device(device.id()).unwrap(), device, "{:?}", patch);
            assert!(broadcaster.emitted().is_empty(), "{:?}", patch);
        }
    }

    #[tokio::test]
    async fn accompanying_patch_is_applied() {
        let device = device_for("u1", 80);
        let store = InMemoryTelemetryStore::new().with_device(device.clone());
        let broadcaster = RecordingBroadcaster::new(&store);

        let outcome = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(
                &identity("u1"),
                IngestReadingCommand {
                    device_id: Some(*device.id()),
                    raw_level: 72.0,
                    patch: DevicePatch::battery(BatteryLevel::try_new(55).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = store.device(device.id()).unwrap();
        assert_eq!(stored.battery_level().map(|b| b.value()), Some(55));
        assert!(stored.is_connected());
        assert_eq!(outcome.device, Some(stored));
    }

    #[tokio::test]
    async fn room_scope_keeps_readings_private() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        handler(&store, &broadcaster, NoiseReadingScope::Room)
            .handle(&identity("u1"), IngestReadingCommand { raw_level: 40.0, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(broadcaster.emitted()[0].target, BroadcastTarget::Room(identity("u1")));
    }

    #[tokio::test]
    async fn disabled_scope_persists_without_broadcast() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        handler(&store, &broadcaster, NoiseReadingScope::Disabled)
            .handle(&identity("u1"), IngestReadingCommand { raw_level: 40.0, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(store.event_count(), 1);
        assert!(broadcaster.emitted().is_empty());
    }

    #[tokio::test]
    async fn patch_without_device_is_rejected() {
        let store = InMemoryTelemetryStore::new();
        let broadcaster = RecordingBroadcaster::new(&store);

        let err = handler(&store, &broadcaster, NoiseReadingScope::Global)
            .handle(
                &identity("u1"),
                IngestReadingCommand {
                    raw_level: 40.0,
                    patch: DevicePatch::connectivity(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TelemetryError::ValidationFailed { .. }));
    }
}
