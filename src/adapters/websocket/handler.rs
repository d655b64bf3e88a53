//! WebSocket upgrade handler for live telemetry connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Authenticate the upgrade request (refused with 401 on failure)
//! 2. Upgrade to WebSocket
//! 3. Join the identity's room
//! 4. Forward queued messages out, dispatch inbound frames
//! 5. Leave the room on close, error or cancellation

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::domain::foundation::{AuthError, AuthenticatedIdentity};

use super::{
    dispatch::InboundDispatcher,
    messages::ServerMessage,
    rooms::{ClientId, ConnectionHandle, RoomManager, SendFailure},
    session_auth::{ConnectionContext, SessionAuthenticator},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub authenticator: SessionAuthenticator,
    pub room_manager: Arc<RoomManager>,
    pub dispatcher: InboundDispatcher,
    /// Capacity of each connection's outbound queue.
    pub connection_buffer: usize,
    /// Longest wait for queue space, for direct replies as for fan-out.
    pub send_timeout: Duration,
}

impl WebSocketState {
    pub fn new(
        authenticator: SessionAuthenticator,
        room_manager: Arc<RoomManager>,
        dispatcher: InboundDispatcher,
        connection_buffer: usize,
        send_timeout: Duration,
    ) -> Self {
        Self {
            authenticator,
            room_manager,
            dispatcher,
            connection_buffer: connection_buffer.max(1),
            send_timeout,
        }
    }
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Session token for clients that cannot set headers.
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebSocketState>,
    headers: HeaderMap,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let identity = match state
        .authenticator
        .admit(&headers, query.token.as_deref())
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected WebSocket upgrade");
            let status = match e {
                AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::UNAUTHORIZED,
            };
            return status.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Schedules `leave` if the connection task is dropped before it cleans up.
struct MembershipGuard {
    rooms: Arc<RoomManager>,
    client_id: ClientId,
    armed: bool,
}

impl MembershipGuard {
    fn new(rooms: Arc<RoomManager>, client_id: ClientId) -> Self {
        Self {
            rooms,
            client_id,
            armed: true,
        }
    }

    async fn release(mut self) {
        self.armed = false;
        self.rooms.leave(&self.client_id).await;
    }
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let rooms = self.rooms.clone();
            let client_id = self.client_id;
            runtime.spawn(async move {
                rooms.leave(&client_id).await;
            });
        }
    }
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection.
async fn handle_socket(socket: WebSocket, identity: AuthenticatedIdentity, state: WebSocketState) {
    let client_id = ClientId::new();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.connection_buffer);

    let handle = ConnectionHandle::new(client_id, tx);
    state.room_manager.join(&identity.id, handle.clone()).await;
    let membership = MembershipGuard::new(state.room_manager.clone(), client_id);

    tracing::info!(client_id = %client_id, identity = %identity.id, "Client connected");

    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::connected(identity.id.as_str(), &client_id.to_string());
    if let Err(e) = send_message(&mut sender, &connected).await {
        tracing::debug!(client_id = %client_id, "Failed to send connected message: {}", e);
        membership.release().await;
        return;
    }

    // Forward queued messages (room fan-out and direct replies) to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(client_id = %client_id, "Send error, closing connection: {}", e);
                break;
            }
        }
    });

    // Dispatch inbound frames
    let dispatcher = state.dispatcher.clone();
    let send_timeout = state.send_timeout;
    let ctx = ConnectionContext::bound(client_id, identity.id.clone());
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Some(reply) = dispatcher.dispatch(&ctx, &text).await {
                        if !send_reply(&handle, reply, send_timeout).await {
                            break;
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(client_id = %ctx.client_id, "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::debug!(client_id = %ctx.client_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(client_id = %ctx.client_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    membership.release().await;
    tracing::info!(client_id = %client_id, identity = %identity.id, "Client disconnected");
}

/// Queue a direct reply. Returns false once the connection's writer is gone.
async fn send_reply(handle: &ConnectionHandle, reply: ServerMessage, timeout: Duration) -> bool {
    match handle.send(reply, timeout).await {
        Ok(()) => true,
        Err(SendFailure::TimedOut) => {
            tracing::warn!(client_id = %handle.client_id(), "Outbound queue full, reply dropped");
            true
        }
        Err(SendFailure::Closed) => false,
    }
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match msg.to_json() {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize server message");
            Ok(())
        }
    }
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{IdentityId, Timestamp};

    #[tokio::test]
    async fn dropped_guard_schedules_leave() {
        let rooms = Arc::new(RoomManager::new());
        let identity = IdentityId::new("u1").unwrap();
        let client_id = ClientId::new();
        let (tx, _rx) = mpsc::channel(1);
        rooms.join(&identity, ConnectionHandle::new(client_id, tx)).await;

        drop(MembershipGuard::new(rooms.clone(), client_id));

        for _ in 0..50 {
            if rooms.total_client_count().await == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(rooms.room_of(&client_id).await, None);
    }

    #[tokio::test]
    async fn reply_to_full_queue_is_dropped_after_timeout() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(ClientId::new(), tx);
        let timeout = Duration::from_millis(10);

        assert!(send_reply(&handle, ServerMessage::pong(Timestamp::now()), timeout).await);
        assert!(send_reply(&handle, ServerMessage::pong(Timestamp::now()), timeout).await);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reply_to_closed_connection_stops_reader() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(ClientId::new(), tx);
        drop(rx);

        assert!(!send_reply(&handle, ServerMessage::pong(Timestamp::now()), Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn released_guard_leaves_immediately() {
        let rooms = Arc::new(RoomManager::new());
        let identity = IdentityId::new("u1").unwrap();
        let client_id = ClientId::new();
        let (tx, _rx) = mpsc::channel(1);
        rooms.join(&identity, ConnectionHandle::new(client_id, tx)).await;

        MembershipGuard::new(rooms.clone(), client_id).release().await;
        assert_eq!(rooms.active_rooms().await, 0);
    }
}
