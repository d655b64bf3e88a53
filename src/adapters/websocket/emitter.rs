//! Broadcast emitter over the room registry.
//!
//! Delivers one canonical event to every target connection concurrently.
//! Each send waits at most `send_timeout`:
//!
//! - queue accepted: delivered
//! - queue full past the timeout: dropped for that peer, connection kept
//! - writer gone: connection evicted from its room

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::domain::telemetry::CanonicalEvent;
use crate::ports::{BroadcastTarget, DeliveryReport, TelemetryBroadcaster};

use super::messages::ServerMessage;
use super::rooms::{RoomManager, SendFailure};

/// [`TelemetryBroadcaster`] backed by a [`RoomManager`].
#[derive(Debug, Clone)]
pub struct RoomBroadcaster {
    rooms: Arc<RoomManager>,
    send_timeout: Duration,
}

impl RoomBroadcaster {
    pub fn new(rooms: Arc<RoomManager>, send_timeout: Duration) -> Self {
        Self { rooms, send_timeout }
    }

    pub fn rooms(&self) -> &Arc<RoomManager> {
        &self.rooms
    }
}

#[async_trait]
impl TelemetryBroadcaster for RoomBroadcaster {
    async fn emit(&self, event: CanonicalEvent, target: BroadcastTarget) -> DeliveryReport {
        let kind = event.kind();
        let connections = match &target {
            BroadcastTarget::Room(identity) => self.rooms.connections(identity).await,
            BroadcastTarget::All => self.rooms.all_connections().await,
        };

        if connections.is_empty() {
            tracing::trace!(event = kind, "No subscribers");
            return DeliveryReport::default();
        }

        let msg = ServerMessage::from(event);
        let timeout = self.send_timeout;
        let outcomes = join_all(connections.into_iter().map(|conn| {
            let msg = msg.clone();
            async move {
                let result = conn.send(msg, timeout).await;
                (conn.client_id(), result)
            }
        }))
        .await;

        let mut report = DeliveryReport::default();
        for (client_id, result) in outcomes {
            match result {
                Ok(()) => report.delivered += 1,
                Err(SendFailure::TimedOut) => {
                    tracing::warn!(client_id = %client_id, event = kind, "Slow client, event dropped");
                    report.dropped += 1;
                }
                Err(SendFailure::Closed) => {
                    tracing::debug!(client_id = %client_id, event = kind, "Removing closed connection");
                    self.rooms.leave(&client_id).await;
                    report.evicted += 1;
                }
            }
        }

        tracing::debug!(
            event = kind,
            delivered = report.delivered,
            dropped = report.dropped,
            evicted = report.evicted,
            "Broadcast complete"
        );
        report
    }
}
