//! WebSocket Connection Hub
//!
//! Tracks connected feed clients and which event kinds each one subscribed
//! to, and fans published events out to the matching connections.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::feed::{EventKind, ServerMessage};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Event kinds this connection is subscribed to
    pub subscriptions: HashSet<EventKind>,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection, dropping all of its subscriptions
    pub async fn unregister(&self, id: &str) {
        if self.connections.write().await.remove(id).is_some() {
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Subscribe a connection to event kinds
    pub async fn subscribe(
        &self,
        id: &str,
        events: Vec<EventKind>,
    ) -> Result<Vec<EventKind>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        handle.subscriptions.extend(events.iter().copied());

        tracing::debug!(connection_id = %id, events = ?events, "Subscribed");
        Ok(events)
    }

    /// Unsubscribe a connection from event kinds
    pub async fn unsubscribe(
        &self,
        id: &str,
        events: Vec<EventKind>,
    ) -> Result<Vec<EventKind>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let removed: Vec<EventKind> = events
            .into_iter()
            .filter(|kind| handle.subscriptions.remove(kind))
            .collect();

        tracing::debug!(connection_id = %id, events = ?removed, "Unsubscribed");
        Ok(removed)
    }

    /// Send `message` to every connection subscribed to `kind`.
    ///
    /// Returns how many connections it was handed to.
    pub async fn broadcast(&self, kind: EventKind, message: &ServerMessage) -> usize {
        let connections = self.connections.read().await;

        let sent = connections
            .values()
            .filter(|handle| handle.subscriptions.contains(&kind))
            .filter(|handle| handle.sender.send(message.clone()).is_ok())
            .count();

        tracing::trace!(kind = %kind, subscribers = sent, "Broadcast event");
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections subscribed to an event kind
    pub async fn subscriber_count(&self, kind: EventKind) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|handle| handle.subscriptions.contains(&kind))
            .count()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
