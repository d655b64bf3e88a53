//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Session token validators (JWT, mock)
//! - `http` - Router assembly and health check
//! - `memory` - In-memory telemetry store
//! - `postgres` - PostgreSQL telemetry store
//! - `websocket` - Live connections, rooms and fan-out

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
