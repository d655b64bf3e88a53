//! ListDevicesHandler - Devices owned by an identity.

use std::sync::Arc;

use crate::domain::foundation::IdentityId;
use crate::domain::telemetry::{Device, TelemetryError};
use crate::ports::TelemetryStore;

/// Query handler for an identity's devices.
pub struct ListDevicesHandler {
    store: Arc<dyn TelemetryStore>,
}

impl ListDevicesHandler {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Devices ordered by registration time, oldest first.
    pub async fn handle(&self, identity: &IdentityId) -> Result<Vec<Device>, TelemetryError> {
        let mut devices = self.store.find_devices_by_owner(identity).await?;
        devices.sort_by_key(|d| d.created_at());
        Ok(devices)
    }
}
