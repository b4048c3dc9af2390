//! Registry of live WebSocket connections and their subscription state.
//!
//! The registry owns the single piece of mutable shared state in the
//! broadcast core. Every mutation goes through the write lock, so
//! register/unregister/touch are atomic with respect to each other and with
//! respect to broadcast iteration.

use axum::extract::ws::Message as WsMessage;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::models::{ClientConnection, ConnectionId};

mod reaper;
pub use reaper::StaleConnectionReaper;

#[cfg(test)]
mod tests;

/// Connection evicted by the staleness reaper.
#[derive(Debug, Clone)]
pub struct ReapedConnection {
    pub id: ConnectionId,
    pub user_id: Option<i64>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly opened socket. The returned id is the handle for
    /// every later registry operation on this connection.
    pub async fn register(&self, sender: mpsc::UnboundedSender<WsMessage>) -> ConnectionId {
        let connection = ClientConnection::new(sender);
        let id = connection.id;
        self.connections.write().await.insert(id, connection);
        tracing::info!(connection_id = %id, "client connected");
        id
    }

    /// Remove a connection. Returns false when it was already gone (e.g.
    /// reaped while the socket task was shutting down).
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            tracing::info!(connection_id = %id, "client unregistered");
        }
        removed
    }

    /// Record inbound activity for staleness tracking.
    pub async fn touch(&self, id: &ConnectionId) {
        if let Some(conn) = self.connections.write().await.get_mut(id) {
            conn.last_activity = Utc::now();
        }
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<ClientConnection> {
        self.connections.read().await.get(id).cloned()
    }

    /// Snapshot of every live connection. Callers iterate the snapshot, so
    /// connections joining mid-broadcast are not included.
    pub async fn all(&self) -> Vec<ClientConnection> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Every connection identified as the given user (a user may hold
    /// several simultaneous connections, e.g. multiple tabs).
    pub async fn by_user(&self, user_id: i64) -> Vec<ClientConnection> {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.user_id == Some(user_id))
            .cloned()
            .collect()
    }

    pub async fn set_user(&self, id: &ConnectionId, user_id: i64) {
        if let Some(conn) = self.connections.write().await.get_mut(id) {
            conn.user_id = Some(user_id);
        }
    }

    /// Replace (never merge) the circle interest set of a connection.
    pub async fn replace_circle_interests(&self, id: &ConnectionId, circles: HashSet<i64>) {
        if let Some(conn) = self.connections.write().await.get_mut(id) {
            conn.circle_interests = circles;
        }
    }

    /// Replace (never merge) the commodity interest set of a connection.
    pub async fn replace_commodity_interests(&self, id: &ConnectionId, commodities: HashSet<i64>) {
        if let Some(conn) = self.connections.write().await.get_mut(id) {
            conn.commodity_interests = commodities;
        }
    }

    /// Whether any live connection cares about this circle or this
    /// commodity. The price simulator skips pairs nobody would receive.
    pub async fn has_audience(&self, circle_id: i64, commodity_id: i64) -> bool {
        self.connections.read().await.values().any(|c| {
            c.circle_interests.contains(&circle_id)
                || c.commodity_interests.contains(&commodity_id)
        })
    }

    /// Evict every connection whose last activity is strictly before the
    /// cutoff. Removing the entry drops its outbound sender, which the
    /// socket task observes as a closed channel and answers by closing the
    /// socket; no farewell message is sent to the client.
    pub async fn reap_stale(&self, cutoff: DateTime<Utc>) -> Vec<ReapedConnection> {
        let mut connections = self.connections.write().await;
        let stale: Vec<ConnectionId> = connections
            .iter()
            .filter(|(_, c)| c.last_activity < cutoff)
            .map(|(id, _)| *id)
            .collect();

        let mut reaped = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(conn) = connections.remove(&id) {
                reaped.push(ReapedConnection {
                    id,
                    user_id: conn.user_id,
                    last_activity: conn.last_activity,
                });
            }
        }
        reaped
    }

    /// Rewind a connection's activity clock, so reaper tests can age
    /// connections without sleeping through real thresholds.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, id: &ConnectionId, seconds: i64) {
        if let Some(conn) = self.connections.write().await.get_mut(id) {
            conn.last_activity = Utc::now() - chrono::Duration::seconds(seconds);
        }
    }
}
