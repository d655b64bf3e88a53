//! WebSocket adapters for live telemetry.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   GET /ws  →  SessionAuthenticator::admit  →  401 on failure        │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ upgrade
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   Connection: reader loop → InboundDispatcher → application handler │
//! │               writer task ← mpsc queue                              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ committed changes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   RoomBroadcaster → RoomManager                                     │
//! │   Room: user-123       Room: user-456                               │
//! │   ├── client-a         ├── client-d                                 │
//! │   └── client-b         └── client-e                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Wire protocol types
//! - [`rooms`] - Identity rooms and connection handles
//! - [`emitter`] - `TelemetryBroadcaster` over the rooms
//! - [`session_auth`] - Upgrade authentication and the per-message guard
//! - [`dispatch`] - Routing of inbound frames
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod dispatch;
pub mod emitter;
pub mod handler;
pub mod messages;
pub mod rooms;
pub mod session_auth;

pub use dispatch::InboundDispatcher;
pub use emitter::RoomBroadcaster;
pub use handler::{websocket_router, ws_handler, ConnectQuery, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage,
};
pub use rooms::{ClientId, ConnectionHandle, RoomManager, SendFailure};
pub use session_auth::{ConnectionContext, GuardOutcome, SessionAuthenticator};
