//! Telemetry store port (persistence gateway).
//!
//! Defines the contract for persisting devices and telemetry events.
//! Every mutation goes through an explicit [`TelemetryTransaction`] that the
//! caller commits or rolls back at one boundary per logical operation.
//!
//! # Design
//!
//! - **Owner-scoped**: device lookups always take the owning identity, so a
//!   foreign device is indistinguishable from a missing one
//! - **Row locking**: `lock_device` serializes concurrent mutations of the
//!   same device until the transaction ends
//! - **Drop means rollback**: a transaction that is dropped uncommitted
//!   leaves no trace

use async_trait::async_trait;

use crate::domain::foundation::{
    AuthenticatedIdentity, DeviceId, DomainError, IdentityId, Timestamp,
};
use crate::domain::telemetry::{Device, DevicePatch, TelemetryEvent, TimeRange};

/// Repository port for devices, telemetry events and identities.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` if no connection could be acquired
    async fn begin(&self) -> Result<Box<dyn TelemetryTransaction>, DomainError>;

    /// Record an identity the first time it is seen.
    ///
    /// Returns `true` if the identity was created by this call.
    async fn ensure_identity(&self, identity: &AuthenticatedIdentity) -> Result<bool, DomainError>;

    /// All devices owned by an identity. Order is not significant.
    async fn find_devices_by_owner(&self, owner: &IdentityId) -> Result<Vec<Device>, DomainError>;

    /// Telemetry events owned by an identity, newest first.
    async fn find_events_by_owner(
        &self,
        owner: &IdentityId,
        range: Option<TimeRange>,
        limit: Option<u32>,
    ) -> Result<Vec<TelemetryEvent>, DomainError>;
}

/// A unit of work against the telemetry store.
#[async_trait]
pub trait TelemetryTransaction: Send {
    /// Insert a new device.
    async fn create_device(&mut self, device: &Device) -> Result<(), DomainError>;

    /// Load a device owned by `owner` and lock it until the transaction ends.
    ///
    /// Returns `None` if no such device is owned by `owner`.
    async fn lock_device(
        &mut self,
        id: &DeviceId,
        owner: &IdentityId,
    ) -> Result<Option<Device>, DomainError>;

    /// Write back a device previously returned by `lock_device`.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound` if the device does not exist
    /// - `DatabaseError` on persistence failure
    async fn update_device(&mut self, device: &Device) -> Result<(), DomainError>;

    /// Insert a telemetry event.
    async fn create_event(&mut self, event: &TelemetryEvent) -> Result<(), DomainError>;

    /// Make every write of this transaction durable.
    ///
    /// On error nothing from this transaction is visible.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard every write of this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;

    /// Lock, patch and write back a device in one step.
    ///
    /// Returns `None` when the device is not owned by `owner`. Nothing is
    /// written if the patch changes no value.
    async fn patch_device(
        &mut self,
        id: &DeviceId,
        owner: &IdentityId,
        patch: &DevicePatch,
        now: Timestamp,
    ) -> Result<Option<Device>, DomainError> {
        let Some(mut device) = self.lock_device(id, owner).await? else {
            return Ok(None);
        };

        if device.apply_patch(patch, now) {
            self.update_device(&device).await?;
        }

        Ok(Some(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn TelemetryStore) {}
    }

    #[test]
    fn telemetry_transaction_is_object_safe() {
        fn _accepts_dyn(_tx: Box<dyn TelemetryTransaction>) {}
    }
}
