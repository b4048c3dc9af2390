//! Domain event entry points for the rest of the application.
//!
//! Other subsystems (listings, offers, trades, circles) call into this
//! service to push their events onto the live channel. Everything here is
//! best-effort: delivery is neither confirmed nor retried.

use chrono::Utc;

use crate::broadcaster::Broadcaster;
use crate::models::{
    CircleUpdateType, Listing, ListingAction, Offer, Priority, ServerMessage, Trade,
};

#[derive(Clone)]
pub struct LiveEvents {
    broadcaster: Broadcaster,
}

impl LiveEvents {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self { broadcaster }
    }

    /// Announce a freshly created listing to its circle and commodity topics.
    pub async fn notify_new_listing(&self, listing: &Listing) {
        let message = ServerMessage::ListingUpdate {
            timestamp: Utc::now(),
            listing_id: listing.id,
            action: ListingAction::New,
            commodity_id: listing.commodity_id,
            circle_id: listing.circle_id,
            listing_type: listing.listing_type,
        };

        self.broadcaster
            .broadcast_to_circle(listing.circle_id, &message)
            .await;
        self.broadcaster
            .broadcast_to_commodity(listing.commodity_id, &message)
            .await;
    }

    /// Tell a seller an offer landed on their listing.
    /// Returns whether any of the seller's connections was reached.
    pub async fn notify_offer_received(&self, offer: &Offer) -> bool {
        let message = ServerMessage::OfferReceived {
            timestamp: Utc::now(),
            offer_id: offer.id,
            listing_id: offer.listing_id,
            buyer_id: offer.buyer_id,
            seller_id: offer.seller_id,
            commodity_id: offer.commodity_id,
            quantity: offer.quantity,
            price_per_unit: offer.price_per_unit,
        };

        self.broadcaster
            .send_to_user(offer.seller_id, &message)
            .await
    }

    /// Tell both parties a trade changed state.
    pub async fn notify_trade_update(&self, trade: &Trade) {
        let message = ServerMessage::TradeUpdate {
            timestamp: Utc::now(),
            trade_id: trade.id,
            buyer_id: trade.buyer_id,
            seller_id: trade.seller_id,
            status: trade.status.clone(),
            commodity_id: trade.commodity_id,
        };

        self.broadcaster.send_to_user(trade.buyer_id, &message).await;
        self.broadcaster
            .send_to_user(trade.seller_id, &message)
            .await;
    }

    /// Push circle activity (market activity, membership, events) to the
    /// circle's subscribers.
    pub async fn notify_circle_activity(
        &self,
        circle_id: i64,
        update_type: CircleUpdateType,
        data: serde_json::Value,
    ) {
        let message = ServerMessage::CircleUpdate {
            timestamp: Utc::now(),
            circle_id,
            update_type,
            data,
        };
        self.broadcaster.broadcast_to_circle(circle_id, &message).await;
    }

    /// Broadcast a general notification to every connected client.
    pub async fn broadcast_notification(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        priority: Priority,
    ) -> usize {
        let message = ServerMessage::notification(title, body, priority);
        self.broadcaster.broadcast_all(&message).await
    }

    /// Unicast a notification to one user's connections.
    pub async fn notify_user(
        &self,
        user_id: i64,
        title: impl Into<String>,
        body: impl Into<String>,
        priority: Priority,
    ) -> bool {
        let message = ServerMessage::notification(title, body, priority);
        self.broadcaster.send_to_user(user_id, &message).await
    }
}
