//! Read-only market snapshot types fetched from the collaborator data layer,
//! plus the domain event records other subsystems hand to the notify API.

use serde::{Deserialize, Serialize};

use super::message::ListingType;

/// Commodity category, used for fallback price quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommodityCategory {
    Grain,
    Pulse,
    Oilseed,
    Spice,
    Other,
}

impl CommodityCategory {
    /// Fallback quotation (rupees per quintal) for commodities without a
    /// configured base price.
    pub fn default_base_price(&self) -> f64 {
        match self {
            CommodityCategory::Grain => 2500.0,
            CommodityCategory::Pulse => 6000.0,
            CommodityCategory::Oilseed => 4500.0,
            CommodityCategory::Spice => 12000.0,
            CommodityCategory::Other => 3000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub base_price: Option<f64>,
    pub category: CommodityCategory,
}

impl Commodity {
    /// Configured base price, falling back to the category default.
    pub fn quoted_base_price(&self) -> f64 {
        self.base_price
            .unwrap_or_else(|| self.category.default_base_price())
    }
}

/// A regional trading circle (physical market / hub) used as a routing topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub id: i64,
    pub name: String,
}

/// Listing snapshot handed over by the marketplace subsystem.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: i64,
    pub commodity_id: i64,
    pub circle_id: i64,
    pub listing_type: ListingType,
}

/// Offer snapshot handed over by the marketplace subsystem.
#[derive(Debug, Clone)]
pub struct Offer {
    pub id: i64,
    pub listing_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub commodity_id: i64,
    pub quantity: f64,
    pub price_per_unit: f64,
}

/// Trade snapshot handed over by the marketplace subsystem.
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub status: String,
    pub commodity_id: i64,
}
