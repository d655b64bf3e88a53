//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresTelemetryStore` - Devices, telemetry events and identities

mod telemetry_store;

pub use telemetry_store::{PostgresTelemetryStore, PostgresTelemetryTransaction};
