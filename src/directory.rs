//! Read-only port onto the collaborator data layer.
//!
//! The broadcast core never mutates marketplace data; it only pulls
//! commodity/circle snapshots for the price feed and a user's stored
//! memberships when a connection identifies itself.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Circle, Commodity};

/// Collaborator data-layer interface. Read-only and idempotent; every call
/// re-fetches, nothing is cached on this side.
#[async_trait]
pub trait MarketDirectory: Send + Sync {
    async fn list_commodities(&self) -> Result<Vec<Commodity>>;
    async fn list_circles(&self) -> Result<Vec<Circle>>;
    /// Circle memberships stored for a user.
    async fn user_circles(&self, user_id: i64) -> Result<Vec<i64>>;
    /// Commodities a user follows.
    async fn user_commodities(&self, user_id: i64) -> Result<Vec<i64>>;
}

/// In-process directory implementation backing the standalone server binary
/// and the test suite. Collaborating subsystems keep it current through the
/// insert/set methods; unknown users simply have no stored subscriptions.
#[derive(Clone, Default)]
pub struct InMemoryMarketDirectory {
    commodities: Arc<RwLock<Vec<Commodity>>>,
    circles: Arc<RwLock<Vec<Circle>>>,
    user_circles: Arc<RwLock<HashMap<i64, Vec<i64>>>>,
    user_commodities: Arc<RwLock<HashMap<i64, Vec<i64>>>>,
}

impl InMemoryMarketDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_commodity(&self, commodity: Commodity) {
        self.commodities.write().await.push(commodity);
    }

    pub async fn insert_circle(&self, circle: Circle) {
        self.circles.write().await.push(circle);
    }

    pub async fn set_user_circles(&self, user_id: i64, circles: Vec<i64>) {
        self.user_circles.write().await.insert(user_id, circles);
    }

    pub async fn set_user_commodities(&self, user_id: i64, commodities: Vec<i64>) {
        self.user_commodities
            .write()
            .await
            .insert(user_id, commodities);
    }
}

#[async_trait]
impl MarketDirectory for InMemoryMarketDirectory {
    async fn list_commodities(&self) -> Result<Vec<Commodity>> {
        Ok(self.commodities.read().await.clone())
    }

    async fn list_circles(&self) -> Result<Vec<Circle>> {
        Ok(self.circles.read().await.clone())
    }

    async fn user_circles(&self, user_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .user_circles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn user_commodities(&self, user_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .user_commodities
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}
