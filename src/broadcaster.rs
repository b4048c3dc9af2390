//! Fan-out of server messages to interested connections.
//!
//! All sends are fire-and-forget: the message is serialized once, pushed
//! onto each recipient's outbound channel, and never acknowledged. A
//! connection whose socket task has already exited is skipped silently;
//! that is expected churn, not an error.

use axum::extract::ws::Message as WsMessage;

use crate::connection_registry::ConnectionRegistry;
use crate::models::{ConnectionId, ServerMessage};

#[derive(Clone)]
pub struct Broadcaster {
    registry: ConnectionRegistry,
}

impl Broadcaster {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Serialize once per broadcast call.
    fn encode(message: &ServerMessage) -> Option<WsMessage> {
        match serde_json::to_string(message) {
            Ok(json) => Some(WsMessage::Text(json)),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize outbound message");
                None
            }
        }
    }

    /// Unicast to one connection handle. Used for identify confirmations.
    pub async fn send_to_connection(&self, id: &ConnectionId, message: &ServerMessage) -> bool {
        let Some(frame) = Self::encode(message) else {
            return false;
        };
        match self.registry.get(id).await {
            Some(conn) => conn.push(frame),
            None => false,
        }
    }

    /// Send to every open connection identified as this user.
    /// Returns whether at least one connection was reached.
    pub async fn send_to_user(&self, user_id: i64, message: &ServerMessage) -> bool {
        let Some(frame) = Self::encode(message) else {
            return false;
        };
        let mut reached = false;
        for conn in self.registry.by_user(user_id).await {
            if conn.push(frame.clone()) {
                reached = true;
            } else {
                tracing::debug!(connection_id = %conn.id, "skipping closed connection");
            }
        }
        reached
    }

    /// Send to every open connection, unconditionally.
    pub async fn broadcast_all(&self, message: &ServerMessage) -> usize {
        let Some(frame) = Self::encode(message) else {
            return 0;
        };
        self.deliver(self.registry.all().await, frame)
    }

    /// Send to every open connection interested in this circle.
    pub async fn broadcast_to_circle(&self, circle_id: i64, message: &ServerMessage) -> usize {
        let Some(frame) = Self::encode(message) else {
            return 0;
        };
        let recipients = self
            .registry
            .all()
            .await
            .into_iter()
            .filter(|c| c.circle_interests.contains(&circle_id))
            .collect();
        self.deliver(recipients, frame)
    }

    /// Send to every open connection interested in this commodity.
    pub async fn broadcast_to_commodity(&self, commodity_id: i64, message: &ServerMessage) -> usize {
        let Some(frame) = Self::encode(message) else {
            return 0;
        };
        let recipients = self
            .registry
            .all()
            .await
            .into_iter()
            .filter(|c| c.commodity_interests.contains(&commodity_id))
            .collect();
        self.deliver(recipients, frame)
    }

    fn deliver(&self, recipients: Vec<crate::models::ClientConnection>, frame: WsMessage) -> usize {
        let mut delivered = 0;
        for conn in recipients {
            if conn.push(frame.clone()) {
                delivered += 1;
            } else {
                tracing::debug!(connection_id = %conn.id, "skipping closed connection");
            }
        }
        delivered
    }
}
