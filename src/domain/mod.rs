//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth types)
//! - `telemetry` - Devices, noise readings, classification and canonical events

pub mod foundation;
pub mod telemetry;
