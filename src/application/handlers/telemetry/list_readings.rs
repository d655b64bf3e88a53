//! ListReadingsHandler - Reading history, newest first.

use std::sync::Arc;

use crate::domain::foundation::IdentityId;
use crate::domain::telemetry::{TelemetryError, TelemetryEvent, TimeRange};
use crate::ports::TelemetryStore;

/// Readings returned when the query names no limit.
pub const DEFAULT_READINGS_LIMIT: u32 = 50;

/// Upper bound on any requested limit.
pub const MAX_READINGS_LIMIT: u32 = 500;

/// Query for reading history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListReadingsQuery {
    /// Only readings inside this inclusive window.
    pub range: Option<TimeRange>,
    pub limit: Option<u32>,
}

impl ListReadingsQuery {
    /// Effective limit: default when absent, clamped to `1..=MAX_READINGS_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_READINGS_LIMIT)
            .clamp(1, MAX_READINGS_LIMIT)
    }
}

/// Query handler for reading history.
pub struct ListReadingsHandler {
    store: Arc<dyn TelemetryStore>,
}

impl ListReadingsHandler {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        identity: &IdentityId,
        query: ListReadingsQuery,
    ) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        let events = self
            .store
            .find_events_by_owner(identity, query.range, Some(query.effective_limit()))
            .await?;
        Ok(events)
    }
}
