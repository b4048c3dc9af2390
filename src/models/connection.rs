//! In-memory state for one live WebSocket connection.

use axum::extract::ws::Message as WsMessage;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle identifying a connection for its registry lifetime.
pub type ConnectionId = Uuid;

/// One live client connection, owned exclusively by the registry from
/// register to unregister (or reaping). Never duplicated for the same socket.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub id: ConnectionId,
    /// Set once the client identifies itself; anonymous until then.
    pub user_id: Option<i64>,
    pub circle_interests: HashSet<i64>,
    pub commodity_interests: HashSet<i64>,
    pub connected_at: DateTime<Utc>,
    /// Updated on every inbound frame; drives staleness reaping.
    pub last_activity: DateTime<Utc>,
    /// Outbound frame channel into the socket task. Sends are non-blocking;
    /// a failed send means the socket is gone and the frame is dropped.
    sender: mpsc::UnboundedSender<WsMessage>,
}

impl ClientConnection {
    pub fn new(sender: mpsc::UnboundedSender<WsMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            circle_interests: HashSet::new(),
            commodity_interests: HashSet::new(),
            connected_at: now,
            last_activity: now,
            sender,
        }
    }

    /// Push a frame to the socket task without blocking.
    /// Returns false when the socket task has already exited.
    pub fn push(&self, frame: WsMessage) -> bool {
        self.sender.send(frame).is_ok()
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}
