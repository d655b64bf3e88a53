//! In-memory telemetry store.
//!
//! Mirrors the transactional behaviour of the PostgreSQL adapter closely
//! enough for handler and pipeline tests:
//!
//! - Writes are staged on the transaction and applied only on commit
//! - `lock_device` holds a per-device async mutex until the transaction ends
//! - Commits can be made to fail on demand
//!
//! Test helpers panic on poisoned locks; port methods report them as
//! `InternalError`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::{
    AuthenticatedIdentity, DeviceId, DomainError, ErrorCode, IdentityId,
};
use crate::domain::telemetry::{Device, TelemetryEvent, TimeRange};
use crate::ports::{TelemetryStore, TelemetryTransaction};

#[derive(Debug, Default)]
struct StoreState {
    identities: HashMap<IdentityId, AuthenticatedIdentity>,
    devices: HashMap<DeviceId, Device>,
    events: Vec<TelemetryEvent>,
}

type DeviceLocks = Mutex<HashMap<DeviceId, Arc<tokio::sync::Mutex<()>>>>;

/// In-memory implementation of [`TelemetryStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTelemetryStore {
    state: Arc<RwLock<StoreState>>,
    device_locks: Arc<DeviceLocks>,
    fail_commits: Arc<AtomicBool>,
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "in-memory store lock poisoned")
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a committed device.
    pub fn with_device(self, device: Device) -> Self {
        self.state
            .write()
            .expect("InMemoryTelemetryStore: state lock poisoned")
            .devices
            .insert(*device.id(), device);
        self
    }

    /// Makes every subsequent commit fail until reset.
    pub fn set_commit_failure(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    // === Test Helpers ===

    /// Committed state of a device.
    pub fn device(&self, id: &DeviceId) -> Option<Device> {
        self.state
            .read()
            .expect("InMemoryTelemetryStore: state lock poisoned")
            .devices
            .get(id)
            .cloned()
    }

    /// Number of committed telemetry events.
    pub fn event_count(&self) -> usize {
        self.state
            .read()
            .expect("InMemoryTelemetryStore: state lock poisoned")
            .events
            .len()
    }

    /// Number of identities seen so far.
    pub fn identity_count(&self) -> usize {
        self.state
            .read()
            .expect("InMemoryTelemetryStore: state lock poisoned")
            .identities
            .len()
    }

    /// Number of per-device locks currently tracked.
    pub fn tracked_lock_count(&self) -> usize {
        self.device_locks
            .lock()
            .expect("InMemoryTelemetryStore: lock map poisoned")
            .len()
    }

    fn device_lock(&self, id: &DeviceId) -> Result<Arc<tokio::sync::Mutex<()>>, DomainError> {
        let mut locks = self.device_locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(*id).or_default().clone())
    }

    /// Forgets the lock for `id` unless another transaction still holds or awaits it.
    fn release_unused_lock(&self, id: &DeviceId) -> Result<(), DomainError> {
        let mut locks = self.device_locks.lock().map_err(|_| poisoned())?;
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for InMemoryTelemetryStore {
    async fn begin(&self) -> Result<Box<dyn TelemetryTransaction>, DomainError> {
        Ok(Box::new(InMemoryTelemetryTransaction {
            store: self.clone(),
            held: HashMap::new(),
            pending_devices: HashMap::new(),
            pending_events: Vec::new(),
        }))
    }

    async fn ensure_identity(&self, identity: &AuthenticatedIdentity) -> Result<bool, DomainError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.identities.contains_key(&identity.id) {
            return Ok(false);
        }
        state.identities.insert(identity.id.clone(), identity.clone());
        Ok(true)
    }

    async fn find_devices_by_owner(&self, owner: &IdentityId) -> Result<Vec<Device>, DomainError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .devices
            .values()
            .filter(|d| d.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn find_events_by_owner(
        &self,
        owner: &IdentityId,
        range: Option<TimeRange>,
        limit: Option<u32>,
    ) -> Result<Vec<TelemetryEvent>, DomainError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut events: Vec<TelemetryEvent> = state
            .events
            .iter()
            .filter(|e| e.owner() == owner)
            .filter(|e| range.map_or(true, |r| r.contains(&e.recorded_at())))
            .cloned()
            .collect();

        events.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
        if let Some(limit) = limit {
            events.truncate(limit as usize);
        }
        Ok(events)
    }
}

/// Staged writes plus the device locks they hold.
pub struct InMemoryTelemetryTransaction {
    store: InMemoryTelemetryStore,
    held: HashMap<DeviceId, OwnedMutexGuard<()>>,
    pending_devices: HashMap<DeviceId, Device>,
    pending_events: Vec<TelemetryEvent>,
}

impl InMemoryTelemetryTransaction {
    fn visible_device(&self, id: &DeviceId) -> Result<Option<Device>, DomainError> {
        if let Some(device) = self.pending_devices.get(id) {
            return Ok(Some(device.clone()));
        }
        let state = self.store.state.read().map_err(|_| poisoned())?;
        Ok(state.devices.get(id).cloned())
    }
}

#[async_trait]
impl TelemetryTransaction for InMemoryTelemetryTransaction {
    async fn create_device(&mut self, device: &Device) -> Result<(), DomainError> {
        if self.visible_device(device.id())?.is_some() {
            return Err(DomainError::database(format!(
                "Device {} already exists",
                device.id()
            )));
        }
        self.pending_devices.insert(*device.id(), device.clone());
        Ok(())
    }

    async fn lock_device(
        &mut self,
        id: &DeviceId,
        owner: &IdentityId,
    ) -> Result<Option<Device>, DomainError> {
        if !self.held.contains_key(id) {
            let guard = self.store.device_lock(id)?.lock_owned().await;
            self.held.insert(*id, guard);
        }

        let device = self.visible_device(id)?;
        if device.is_none() {
            drop(self.held.remove(id));
            self.store.release_unused_lock(id)?;
            return Ok(None);
        }
        Ok(device.filter(|d| d.is_owned_by(owner)))
    }

    async fn update_device(&mut self, device: &Device) -> Result<(), DomainError> {
        if self.visible_device(device.id())?.is_none() {
            return Err(DomainError::new(ErrorCode::DeviceNotFound, "Device not found")
                .with_detail("device_id", device.id().to_string()));
        }
        self.pending_devices.insert(*device.id(), device.clone());
        Ok(())
    }

    async fn create_event(&mut self, event: &TelemetryEvent) -> Result<(), DomainError> {
        if let Some(device_id) = event.device_id() {
            if self.visible_device(device_id)?.is_none() {
                return Err(DomainError::database(format!(
                    "Event references unknown device {}",
                    device_id
                )));
            }
        }
        self.pending_events.push(event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        if self.store.fail_commits.load(Ordering::SeqCst) {
            return Err(DomainError::database("commit rejected"));
        }

        let this = *self;
        let mut state = this.store.state.write().map_err(|_| poisoned())?;
        state.devices.extend(this.pending_devices);
        state.events.extend(this.pending_events);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}
