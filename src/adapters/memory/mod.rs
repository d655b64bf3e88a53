//! In-memory adapters for tests and local runs without a database.

mod telemetry_store;

pub use telemetry_store::{InMemoryTelemetryStore, InMemoryTelemetryTransaction};
