//! Wire message types for the live update channel.
//!
//! Outbound messages are a closed tagged union: every variant carries the
//! event creation time (not delivery time) and is serialized once per send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification priority shown to the client UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingAction {
    New,
    Updated,
    Expired,
    Completed,
}

/// Whether a listing offers to buy or to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleUpdateType {
    MarketActivity,
    NewMember,
    Event,
}

/// Server → client message.
///
/// The `type` tag and payload field names follow the JSON wire contract the
/// web clients already speak (`price_update`, `commodityId`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Notification {
        timestamp: DateTime<Utc>,
        title: String,
        message: String,
        priority: Priority,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PriceUpdate {
        timestamp: DateTime<Utc>,
        commodity_id: i64,
        circle_id: i64,
        new_price: f64,
        price_change: f64,
        change_percentage: f64,
        change_direction: ChangeDirection,
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        arrivals: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ListingUpdate {
        timestamp: DateTime<Utc>,
        listing_id: i64,
        action: ListingAction,
        commodity_id: i64,
        circle_id: i64,
        listing_type: ListingType,
    },
    #[serde(rename_all = "camelCase")]
    OfferReceived {
        timestamp: DateTime<Utc>,
        offer_id: i64,
        listing_id: i64,
        buyer_id: i64,
        seller_id: i64,
        commodity_id: i64,
        quantity: f64,
        price_per_unit: f64,
    },
    #[serde(rename_all = "camelCase")]
    TradeUpdate {
        timestamp: DateTime<Utc>,
        trade_id: i64,
        buyer_id: i64,
        seller_id: i64,
        status: String,
        commodity_id: i64,
    },
    #[serde(rename_all = "camelCase")]
    CircleUpdate {
        timestamp: DateTime<Utc>,
        circle_id: i64,
        update_type: CircleUpdateType,
        data: serde_json::Value,
    },
}

impl ServerMessage {
    /// Shorthand for the plain notification variant without link or icon.
    pub fn notification(
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
    ) -> Self {
        ServerMessage::Notification {
            timestamp: Utc::now(),
            title: title.into(),
            message: message.into(),
            priority,
            link: None,
            icon: None,
        }
    }
}

/// Client → server message. The only inbound kind is the identify message a
/// connection sends after opening to declare its identity and subscriptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Connect {
        #[serde(default)]
        user_id: Option<i64>,
        #[serde(default)]
        circles: Option<Vec<i64>>,
        #[serde(default)]
        commodities: Option<Vec<i64>>,
    },
}
