//! WebSocket room management for identity-scoped fan-out.
//!
//! Every connection is bound to exactly one identity. All connections of
//! one identity form that identity's room.
//!
//! # Architecture
//!
//! ```text
//! Room: user-123       Room: user-456
//! ├── client-a         ├── client-d
//! ├── client-b         └── client-e
//! └── client-c
//! ```
//!
//! A device update from user-123 reaches clients a, b and c only.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::domain::foundation::IdentityId;

use super::messages::ServerMessage;

/// Unique identifier for a WebSocket client connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a send to one connection did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The connection's writer is gone.
    Closed,
    /// The connection's queue stayed full for the whole timeout.
    TimedOut,
}

/// Sending half of one connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    client_id: ClientId,
    sender: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(client_id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { client_id, sender }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue a message, waiting at most `timeout` for room in the queue.
    pub async fn send(&self, msg: ServerMessage, timeout: Duration) -> Result<(), SendFailure> {
        match tokio::time::timeout(timeout, self.sender.send(msg)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendFailure::Closed),
            Err(_) => Err(SendFailure::TimedOut),
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    rooms: HashMap<IdentityId, HashMap<ClientId, ConnectionHandle>>,
    client_rooms: HashMap<ClientId, IdentityId>,
}

/// Manages WebSocket connection rooms organized by identity.
///
/// Provides:
/// - Idempotent join and leave
/// - Member lookup for room and global fan-out
/// - Automatic cleanup of empty rooms
///
/// # Thread Safety
///
/// The room map and the client → room index live behind one `RwLock`, so
/// they are always updated together. Lookups for fan-out take the read lock.
#[derive(Debug, Default)]
pub struct RoomManager {
    registry: RwLock<Registry>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a connection to an identity's room, creating the room if absent.
    ///
    /// A connection already in another room is moved. Returns `false` if the
    /// connection was already a member of this room.
    pub async fn join(&self, identity: &IdentityId, handle: ConnectionHandle) -> bool {
        let mut registry = self.registry.write().await;
        let client_id = handle.client_id();

        match registry.client_rooms.get(&client_id).cloned() {
            Some(current) if &current == identity => return false,
            Some(current) => remove_member(&mut registry.rooms, &current, &client_id),
            None => {}
        }

        registry
            .rooms
            .entry(identity.clone())
            .or_default()
            .insert(client_id, handle);
        registry.client_rooms.insert(client_id, identity.clone());

        tracing::debug!(client_id = %client_id, identity = %identity, "Joined room");
        true
    }

    /// Remove a connection from its room.
    ///
    /// Returns the identity whose room it left, or `None` if it was not a member.
    pub async fn leave(&self, client_id: &ClientId) -> Option<IdentityId> {
        let mut registry = self.registry.write().await;
        let identity = registry.client_rooms.remove(client_id)?;
        remove_member(&mut registry.rooms, &identity, client_id);

        tracing::debug!(client_id = %client_id, identity = %identity, "Left room");
        Some(identity)
    }

    /// Client ids in an identity's room.
    pub async fn members(&self, identity: &IdentityId) -> Vec<ClientId> {
        self.registry
            .read()
            .await
            .rooms
            .get(identity)
            .map(|room| room.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Connection handles in an identity's room.
    pub async fn connections(&self, identity: &IdentityId) -> Vec<ConnectionHandle> {
        self.registry
            .read()
            .await
            .rooms
            .get(identity)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every live connection across all rooms.
    pub async fn all_connections(&self) -> Vec<ConnectionHandle> {
        self.registry
            .read()
            .await
            .rooms
            .values()
            .flat_map(|room| room.values().cloned())
            .collect()
    }

    /// The identity a connection is bound to.
    pub async fn room_of(&self, client_id: &ClientId) -> Option<IdentityId> {
        self.registry.read().await.client_rooms.get(client_id).cloned()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Monitoring
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn client_count(&self, identity: &IdentityId) -> usize {
        self.registry
            .read()
            .await
            .rooms
            .get(identity)
            .map_or(0, HashMap::len)
    }

    pub async fn active_rooms(&self) -> usize {
        self.registry.read().await.rooms.len()
    }

    pub async fn total_client_count(&self) -> usize {
        self.registry.read().await.client_rooms.len()
    }
}

fn remove_member(
    rooms: &mut HashMap<IdentityId, HashMap<ClientId, ConnectionHandle>>,
    identity: &IdentityId,
    client_id: &ClientId,
) {
    if let Some(room) = rooms.get_mut(identity) {
        room.remove(client_id);
        if room.is_empty() {
            rooms.remove(identity);
        }
    }
}
