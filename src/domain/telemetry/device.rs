//! Device entity and partial-update patches.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DeviceId, IdentityId, Timestamp, ValidationError};

/// Device type recorded when a registration does not name one.
pub const DEFAULT_DEVICE_TYPE: &str = "earbuds";

/// Battery level reported by a newly registered device that sent none.
pub const DEFAULT_BATTERY_LEVEL: u8 = 100;

/// Battery charge, 0-100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// Creates a BatteryLevel, returning error if out of range.
    pub fn try_new(value: i64) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&value) {
            return Err(ValidationError::out_of_range("batteryLevel", 0, 100, value));
        }
        Ok(Self(value as u8))
    }

    /// Returns the charge percentage.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Partial update for a device. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub battery_level: Option<BatteryLevel>,
    pub is_connected: Option<bool>,
}

impl DevicePatch {
    /// Patch that only sets the battery level.
    pub fn battery(level: BatteryLevel) -> Self {
        Self {
            battery_level: Some(level),
            is_connected: None,
        }
    }

    /// Patch that only sets connectivity.
    pub fn connectivity(is_connected: bool) -> Self {
        Self {
            battery_level: None,
            is_connected: Some(is_connected),
        }
    }

    /// Returns true if no field would be touched.
    pub fn is_empty(&self) -> bool {
        self.battery_level.is_none() && self.is_connected.is_none()
    }
}

/// A device owned by exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    owner: IdentityId,
    name: String,
    device_type: String,
    battery_level: Option<BatteryLevel>,
    is_connected: bool,
    last_connected: Timestamp,
    created_at: Timestamp,
}

impl Device {
    /// Registers a new, connected device.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name (or an explicitly supplied type) is blank
    pub fn register(
        owner: IdentityId,
        name: impl Into<String>,
        device_type: Option<String>,
        battery_level: Option<BatteryLevel>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("deviceName"));
        }

        let device_type = match device_type {
            Some(t) if t.trim().is_empty() => return Err(ValidationError::empty_field("deviceType")),
            Some(t) => t.trim().to_string(),
            None => DEFAULT_DEVICE_TYPE.to_string(),
        };

        Ok(Self {
            id: DeviceId::new(),
            owner,
            name,
            device_type,
            battery_level: Some(battery_level.unwrap_or(BatteryLevel(DEFAULT_BATTERY_LEVEL))),
            is_connected: true,
            last_connected: now,
            created_at: now,
        })
    }

    /// Rebuilds a device from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: DeviceId,
        owner: IdentityId,
        name: String,
        device_type: String,
        battery_level: Option<BatteryLevel>,
        is_connected: bool,
        last_connected: Timestamp,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            device_type,
            battery_level,
            is_connected,
            last_connected,
            created_at,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn owner(&self) -> &IdentityId {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn battery_level(&self) -> Option<BatteryLevel> {
        self.battery_level
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn last_connected(&self) -> Timestamp {
        self.last_connected
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns true if `identity` owns this device.
    pub fn is_owned_by(&self, identity: &IdentityId) -> bool {
        &self.owner == identity
    }

    /// Applies the fields present in `patch`.
    ///
    /// `last_connected` moves to `now` when battery or connectivity actually
    /// changes value. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &DevicePatch, now: Timestamp) -> bool {
        let mut changed = false;

        if let Some(level) = patch.battery_level {
            if self.battery_level != Some(level) {
                self.battery_level = Some(level);
                changed = true;
            }
        }

        if let Some(connected) = patch.is_connected {
            if self.is_connected != connected {
                self.is_connected = connected;
                changed = true;
            }
        }

        if changed {
            self.last_connected = now;
        }
        changed
    }

    /// Marks the device disconnected and stamps the time.
    pub fn disconnect(&mut self, now: Timestamp) {
        self.is_connected = false;
        self.last_connected = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> IdentityId {
        IdentityId::new("user-1").unwrap()
    }

    fn device() -> Device {
        Device::register(owner(), "Left bud", None, Some(BatteryLevel::try_new(80).unwrap()), Timestamp::now())
            .unwrap()
    }

    #[test]
    fn battery_level_accepts_bounds() {
        assert_eq!(BatteryLevel::try_new(0).unwrap().value(), 0);
        assert_eq!(BatteryLevel::try_new(100).unwrap().value(), 100);
    }

    #[test]
    fn battery_level_rejects_out_of_range() {
        assert!(matches!(
            BatteryLevel::try_new(101),
            Err(ValidationError::OutOfRange { actual: 101, .. })
        ));
        assert!(BatteryLevel::try_new(-1).is_err());
    }

    #[test]
    fn register_applies_defaults() {
        let d = Device::register(owner(), "Buds", None, None, Timestamp::now()).unwrap();
        assert_eq!(d.device_type(), DEFAULT_DEVICE_TYPE);
        assert_eq!(d.battery_level().map(|b| b.value()), Some(DEFAULT_BATTERY_LEVEL));
        assert!(d.is_connected());
    }

    #[test]
    fn register_rejects_blank_name() {
        let result = Device::register(owner(), "  ", None, None, Timestamp::now());
        assert_eq!(result, Err(ValidationError::empty_field("deviceName")));
    }

    #[test]
    fn battery_patch_changes_only_battery() {
        let mut d = device();
        let before = d.clone();
        let later = before.last_connected().plus_secs(30);

        let changed = d.apply_patch(&DevicePatch::battery(BatteryLevel::try_new(42).unwrap()), later);

        assert!(changed);
        assert_eq!(d.battery_level().map(|b| b.value()), Some(42));
        assert_eq!(d.is_connected(), before.is_connected());
        assert_eq!(d.name(), before.name());
        assert_eq!(d.device_type(), before.device_type());
        assert_eq!(d.last_connected(), later);
    }

    #[test]
    fn unchanged_values_leave_last_connected_alone() {
        let mut d = device();
        let before = d.last_connected();

        let patch = DevicePatch {
            battery_level: Some(BatteryLevel::try_new(80).unwrap()),
            is_connected: Some(true),
        };
        let changed = d.apply_patch(&patch, before.plus_secs(60));

        assert!(!changed);
        assert_eq!(d.last_connected(), before);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut d = device();
        let before = d.clone();
        assert!(DevicePatch::default().is_empty());
        assert!(!d.apply_patch(&DevicePatch::default(), Timestamp::now().plus_secs(5)));
        assert_eq!(d, before);
    }

    #[test]
    fn disconnect_clears_flag() {
        let mut d = device();
        let at = Timestamp::now().plus_secs(10);
        d.disconnect(at);
        assert!(!d.is_connected());
        assert_eq!(d.last_connected(), at);
    }
}
