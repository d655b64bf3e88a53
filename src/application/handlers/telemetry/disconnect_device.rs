//! DisconnectDeviceHandler - Marks a device as disconnected.

use std::sync::Arc;

use crate::domain::foundation::{DeviceId, IdentityId, Timestamp};
use crate::domain::telemetry::{CanonicalEvent, Device, TelemetryError};
use crate::ports::{BroadcastTarget, TelemetryBroadcaster, TelemetryStore};

use super::abort;

/// Handler for disconnecting devices.
pub struct DisconnectDeviceHandler {
    store: Arc<dyn TelemetryStore>,
    broadcaster: Arc<dyn TelemetryBroadcaster>,
}

impl DisconnectDeviceHandler {
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        broadcaster: Arc<dyn TelemetryBroadcaster>,
    ) -> Self {
        Self { store, broadcaster }
    }

    pub async fn handle(
        &self,
        identity: &IdentityId,
        device_id: DeviceId,
    ) -> Result<Device, TelemetryError> {
        let mut tx = self.store.begin().await?;

        let mut device = match tx.lock_device(&device_id, identity).await {
            Ok(Some(device)) => device,
            Ok(None) => return Err(abort(tx, TelemetryError::not_found(device_id)).await),
            Err(e) => return Err(abort(tx, e).await),
        };

        device.disconnect(Timestamp::now());

        if let Err(e) = tx.update_device(&device).await {
            return Err(abort(tx, e).await);
        }
        tx.commit().await?;

        tracing::info!(identity = %identity, device_id = %device_id, "Device disconnected");

        self.broadcaster
            .emit(
                CanonicalEvent::device_disconnected(&device),
                BroadcastTarget::Room(identity.clone()),
            )
            .await;

        Ok(device)
    }
}
