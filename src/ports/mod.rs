//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TelemetryStore` - Transactional persistence for devices and readings
//! - `SessionValidator` - Identity token validation
//! - `TelemetryBroadcaster` - Fan-out of committed changes to live connections

mod session_validator;
mod telemetry_broadcaster;
mod telemetry_store;

pub use session_validator::SessionValidator;
pub use telemetry_broadcaster::{
    BroadcastTarget, DeliveryReport, NoiseReadingScope, TelemetryBroadcaster,
};
pub use telemetry_store::{TelemetryStore, TelemetryTransaction};
