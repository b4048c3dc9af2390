//! Identify message handler.
//!
//! The identify ("connect") message declares who a connection belongs to and
//! which topics it wants. Subscriptions resolve in two steps: stored
//! memberships fetched for the user, then any explicit circle/commodity
//! arrays, which replace the stored defaults outright.

use std::collections::HashSet;

use super::MessageHandler;
use crate::models::{ConnectionId, Priority, ServerMessage};

impl MessageHandler {
    pub(super) async fn handle_identify(
        &self,
        conn_id: ConnectionId,
        user_id: Option<i64>,
        circles: Option<Vec<i64>>,
        commodities: Option<Vec<i64>>,
    ) {
        if let Some(uid) = user_id {
            self.registry.set_user(&conn_id, uid).await;
            self.install_default_subscriptions(conn_id, uid).await;
        }

        // Explicit input always wins over derived defaults.
        if let Some(circles) = circles {
            self.registry
                .replace_circle_interests(&conn_id, circles.into_iter().collect())
                .await;
        }
        if let Some(commodities) = commodities {
            self.registry
                .replace_commodity_interests(&conn_id, commodities.into_iter().collect())
                .await;
        }

        let confirmation = ServerMessage::notification(
            "Connected",
            "Live market updates are enabled",
            Priority::Low,
        );
        self.broadcaster
            .send_to_connection(&conn_id, &confirmation)
            .await;

        // First identify on an idle server wakes the price feed.
        self.simulator.start_if_needed().await;

        tracing::info!(
            connection_id = %conn_id,
            user_id = ?user_id,
            "client identified"
        );
    }

    /// Install the user's stored circle memberships and commodity follows as
    /// this connection's interest sets. A data-layer failure leaves the
    /// current sets untouched; the client sees no error, just no change.
    async fn install_default_subscriptions(&self, conn_id: ConnectionId, user_id: i64) {
        match self.directory.user_circles(user_id).await {
            Ok(circle_ids) => {
                self.registry
                    .replace_circle_interests(&conn_id, circle_ids.into_iter().collect::<HashSet<_>>())
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    "could not resolve circle memberships, keeping current interests"
                );
            }
        }

        match self.directory.user_commodities(user_id).await {
            Ok(commodity_ids) => {
                self.registry
                    .replace_commodity_interests(
                        &conn_id,
                        commodity_ids.into_iter().collect::<HashSet<_>>(),
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    "could not resolve commodity follows, keeping current interests"
                );
            }
        }
    }
}
