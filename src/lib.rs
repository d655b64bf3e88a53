//! NoiseGuard - real-time hearing-health telemetry.
//!
//! Devices report battery, connectivity and ambient noise levels over a
//! persistent WebSocket. Each reading is classified, persisted, and pushed
//! to the live connections of the identity that owns the device.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
