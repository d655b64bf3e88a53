//! Telemetry events (persisted noise readings) and query ranges.

use crate::domain::foundation::{
    DeviceId, IdentityId, TelemetryEventId, Timestamp, ValidationError,
};

use super::category::{NoiseCategory, NoiseLevel};

/// Location label stored when a reading arrives without one.
pub const DEFAULT_LOCATION: &str = "Real-time monitoring";

/// A single classified noise reading. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    id: TelemetryEventId,
    owner: IdentityId,
    device_id: Option<DeviceId>,
    noise_level: NoiseLevel,
    category: NoiseCategory,
    recorded_at: Timestamp,
    location: String,
}

impl TelemetryEvent {
    /// Records a new reading; the category is derived from the level.
    pub fn record(
        owner: IdentityId,
        device_id: Option<DeviceId>,
        noise_level: NoiseLevel,
        location: Option<String>,
        recorded_at: Timestamp,
    ) -> Self {
        Self::reconstitute(
            TelemetryEventId::new(),
            owner,
            device_id,
            noise_level,
            recorded_at,
            location,
        )
    }

    /// Rebuilds a reading from persisted state, re-deriving its category.
    pub fn reconstitute(
        id: TelemetryEventId,
        owner: IdentityId,
        device_id: Option<DeviceId>,
        noise_level: NoiseLevel,
        recorded_at: Timestamp,
        location: Option<String>,
    ) -> Self {
        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        Self {
            id,
            owner,
            device_id,
            noise_level,
            category: NoiseCategory::classify(noise_level),
            recorded_at,
            location,
        }
    }

    pub fn id(&self) -> &TelemetryEventId {
        &self.id
    }

    pub fn owner(&self) -> &IdentityId {
        &self.owner
    }

    pub fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }

    pub fn noise_level(&self) -> NoiseLevel {
        self.noise_level
    }

    pub fn category(&self) -> NoiseCategory {
        self.category
    }

    pub fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Inclusive time window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
}

impl TimeRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if start.is_after(&end) {
            return Err(ValidationError::invalid_format(
                "startDate",
                "must not be after endDate",
            ));
        }
        Ok(Self { start, end })
    }

    /// The whole UTC day containing `day`.
    pub fn day(day: chrono::NaiveDate) -> Self {
        Self {
            start: Timestamp::start_of_day(day),
            end: Timestamp::end_of_day(day),
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Returns true if `ts` lies inside the window (bounds included).
    pub fn contains(&self, ts: &Timestamp) -> bool {
        !ts.is_before(&self.start) && !ts.is_after(&self.end)
    }
}
