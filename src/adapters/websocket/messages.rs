//! WebSocket message types for live telemetry.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, device and noise events, errors, pongs
//! - Client → Server: device updates, pings
//!
//! Every frame is a JSON text frame tagged by `"type"`.

use serde::{Deserialize, Serialize};

use crate::application::handlers::telemetry::DeviceUpdateRequest;
use crate::domain::foundation::Timestamp;
use crate::domain::telemetry::{
    CanonicalEvent, DevicePresencePayload, DeviceStatusPayload, NoiseReadingPayload,
    TelemetryError,
};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection admitted and joined to its identity's room.
    Connected(ConnectedMessage),

    DeviceStatus(DeviceStatusPayload),

    DeviceConnected(DevicePresencePayload),

    DeviceDisconnected(DevicePresencePayload),

    NoiseReading(NoiseReadingPayload),

    /// Failure of a request made by this connection.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

impl ServerMessage {
    pub fn connected(identity: &str, client_id: &str) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            message: "Connected to real-time updates".to_string(),
            identity: identity.to_string(),
            client_id: client_id.to_string(),
        })
    }

    pub fn error(err: &TelemetryError) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: err.code().to_string(),
            message: err.message(),
        })
    }

    pub fn pong(at: Timestamp) -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: at.to_rfc3339(),
        })
    }

    /// Serialize to a JSON text frame body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<CanonicalEvent> for ServerMessage {
    fn from(event: CanonicalEvent) -> Self {
        match event {
            CanonicalEvent::DeviceStatus(p) => ServerMessage::DeviceStatus(p),
            CanonicalEvent::DeviceConnected(p) => ServerMessage::DeviceConnected(p),
            CanonicalEvent::DeviceDisconnected(p) => ServerMessage::DeviceDisconnected(p),
            CanonicalEvent::NoiseReading(p) => ServerMessage::NoiseReading(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub message: String,
    pub identity: String,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Battery/connectivity patch, optionally carrying a noise reading.
    DeviceUpdate(DeviceUpdateRequest),

    /// Heartbeat request.
    Ping,
}
