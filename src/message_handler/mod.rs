//! Inbound message handling.
//!
//! Parses frames arriving on a client socket and routes them to the
//! appropriate handler. A malformed frame is logged and dropped; the
//! connection stays open.

use std::sync::Arc;

use crate::broadcaster::Broadcaster;
use crate::connection_registry::ConnectionRegistry;
use crate::directory::MarketDirectory;
use crate::models::{ClientMessage, ConnectionId};
use crate::simulator::PriceFeedSimulator;

mod identify;

#[cfg(test)]
mod tests;

pub struct MessageHandler {
    registry: ConnectionRegistry,
    broadcaster: Broadcaster,
    directory: Arc<dyn MarketDirectory>,
    simulator: PriceFeedSimulator,
}

impl MessageHandler {
    pub fn new(
        registry: ConnectionRegistry,
        broadcaster: Broadcaster,
        directory: Arc<dyn MarketDirectory>,
        simulator: PriceFeedSimulator,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            directory,
            simulator,
        }
    }

    /// Parse and dispatch one raw text frame.
    pub async fn handle_frame(&self, conn_id: ConnectionId, raw: &str) {
        match serde_json::from_str::<ClientMessage>(raw) {
            Ok(message) => self.handle_message(conn_id, message).await,
            Err(e) => {
                tracing::warn!(
                    connection_id = %conn_id,
                    error = %e,
                    "dropping malformed client frame"
                );
            }
        }
    }

    pub async fn handle_message(&self, conn_id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::Connect {
                user_id,
                circles,
                commodities,
            } => {
                self.handle_identify(conn_id, user_id, circles, commodities)
                    .await
            }
        }
    }
}
