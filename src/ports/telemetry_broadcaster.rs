//! Telemetry broadcaster port.
//!
//! Fans canonical events out to live connections. Handlers call it only
//! after a transaction commits, so subscribers never observe a write that
//! was later rolled back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::IdentityId;
use crate::domain::telemetry::CanonicalEvent;

/// Who receives an emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BroadcastTarget {
    /// Every connection bound to this identity.
    Room(IdentityId),
    /// Every open connection.
    All,
}

/// Outcome of one emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections whose queue accepted the event.
    pub delivered: usize,
    /// Connections that were too slow; the event was skipped for them.
    pub dropped: usize,
    /// Connections found closed and removed from their room.
    pub evicted: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped + self.evicted
    }
}

/// Delivers canonical events to subscribers.
///
/// Emitting is best-effort: a failing subscriber never blocks or fails
/// delivery to the others, and nothing is reported back to the caller as an
/// error.
#[async_trait]
pub trait TelemetryBroadcaster: Send + Sync {
    async fn emit(&self, event: CanonicalEvent, target: BroadcastTarget) -> DeliveryReport;
}

/// Where `noise_reading` events go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseReadingScope {
    /// Every open connection, regardless of identity.
    #[default]
    Global,
    /// Only the connections of the identity that produced the reading.
    Room,
    /// Readings are persisted but not broadcast.
    Disabled,
}

impl NoiseReadingScope {
    pub fn target_for(&self, identity: &IdentityId) -> Option<BroadcastTarget> {
        match self {
            NoiseReadingScope::Global => Some(BroadcastTarget::All),
            NoiseReadingScope::Room => Some(BroadcastTarget::Room(identity.clone())),
            NoiseReadingScope::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_broadcaster_is_object_safe() {
        fn _accepts_dyn(_broadcaster: &dyn TelemetryBroadcaster) {}
    }

    #[test]
    fn default_scope_is_global() {
        let id = IdentityId::new("user-1").unwrap();
        assert_eq!(NoiseReadingScope::default().target_for(&id), Some(BroadcastTarget::All));
    }

    #[test]
    fn room_scope_targets_owner() {
        let id = IdentityId::new("user-1").unwrap();
        assert_eq!(
            NoiseReadingScope::Room.target_for(&id),
            Some(BroadcastTarget::Room(id.clone()))
        );
        assert_eq!(NoiseReadingScope::Disabled.target_for(&id), None);
    }

    #[test]
    fn scope_deserializes_lowercase() {
        let scope: NoiseReadingScope = serde_json::from_str("\"room\"").unwrap();
        assert_eq!(scope, NoiseReadingScope::Room);
    }

    #[test]
    fn report_counts_attempts() {
        let report = DeliveryReport { delivered: 2, dropped: 1, evicted: 1 };
        assert_eq!(report.attempted(), 4);
    }
}
