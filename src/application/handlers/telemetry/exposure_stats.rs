//! GetExposureStatsHandler - Minutes spent per noise tier on one day.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::foundation::IdentityId;
use crate::domain::telemetry::{ExposureStats, TelemetryError, TimeRange};
use crate::ports::TelemetryStore;

/// Query handler for daily exposure statistics.
pub struct GetExposureStatsHandler {
    store: Arc<dyn TelemetryStore>,
}

impl GetExposureStatsHandler {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Exposure on the UTC calendar day `day`.
    pub async fn handle(
        &self,
        identity: &IdentityId,
        day: NaiveDate,
    ) -> Result<ExposureStats, TelemetryError> {
        let events = self
            .store
            .find_events_by_owner(identity, Some(TimeRange::day(day)), None)
            .await?;

        Ok(ExposureStats::from_categories(events.iter().map(|e| e.category())))
    }
}
