//! Synthetic price feed.
//!
//! In the absence of a genuine market-data feed, this task fabricates
//! plausible price movement so subscribers still receive a steady stream of
//! price updates. The interval task is process-wide two-state: stopped, or
//! running with a live task handle. It starts lazily on the first successful
//! identify and is torn down the moment the registry empties, so an idle
//! server spends nothing.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::broadcaster::Broadcaster;
use crate::connection_registry::ConnectionRegistry;
use crate::directory::MarketDirectory;
use crate::models::{ChangeDirection, Commodity, ServerMessage};

/// Default tick cadence. The first tick after a start fires immediately.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Largest simulated move, as a percentage of the base price.
const MAX_DRIFT_PCT: f64 = 3.0;

#[derive(Clone)]
pub struct PriceFeedSimulator {
    registry: ConnectionRegistry,
    broadcaster: Broadcaster,
    directory: Arc<dyn MarketDirectory>,
    tick_interval: Duration,
    /// None while stopped, Some(handle) while the interval task runs.
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PriceFeedSimulator {
    pub fn new(
        registry: ConnectionRegistry,
        broadcaster: Broadcaster,
        directory: Arc<dyn MarketDirectory>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            directory,
            tick_interval: DEFAULT_TICK_INTERVAL,
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Set a custom tick interval (useful for tests).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Start the interval task unless it is already running. Safe to call on
    /// every identify; a second start while running is a no-op.
    pub async fn start_if_needed(&self) {
        let mut handle = self.task_handle.lock().await;
        if handle.is_some() {
            return;
        }

        tracing::info!(
            interval_secs = self.tick_interval.as_secs(),
            "starting price feed simulator"
        );

        let simulator = self.clone();
        *handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(simulator.tick_interval);
            loop {
                interval.tick().await;
                simulator.run_tick().await;
            }
        }));
    }

    /// Tear the interval task down once the registry holds no connections.
    /// No-op while any client remains.
    pub async fn stop_if_empty(&self) {
        if self.registry.count().await > 0 {
            return;
        }

        let mut handle = self.task_handle.lock().await;
        if let Some(task) = handle.take() {
            task.abort();
            tracing::info!("last client gone, stopping price feed simulator");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    /// One simulation pass. Snapshots are re-fetched from the data layer on
    /// every tick; a fetch failure aborts this tick only and the interval
    /// keeps its schedule.
    pub async fn run_tick(&self) {
        let commodities = match self.directory.list_commodities().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "market directory unavailable, skipping tick");
                return;
            }
        };
        let circles = match self.directory.list_circles().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "market directory unavailable, skipping tick");
                return;
            }
        };

        let mut emitted = 0usize;
        for commodity in &commodities {
            for circle in &circles {
                // No point fabricating an event nobody would receive.
                if !self.registry.has_audience(circle.id, commodity.id).await {
                    continue;
                }

                let update = synthesize_update(commodity, circle.id);
                // Both topic channels get the update independently; a client
                // subscribed to circle and commodity receives it twice.
                self.broadcaster.broadcast_to_circle(circle.id, &update).await;
                self.broadcaster
                    .broadcast_to_commodity(commodity.id, &update)
                    .await;
                emitted += 1;
            }
        }

        if emitted > 0 {
            tracing::debug!(updates = emitted, "simulated price movement");
        }
    }
}

/// Fabricate one price update for a (commodity, circle) pair: a uniform move
/// in ±3% of the base price, with the absolute change rounded to whole
/// rupees, plus display-plausible quality and arrivals fields.
fn synthesize_update(commodity: &Commodity, circle_id: i64) -> ServerMessage {
    let mut rng = rand::thread_rng();

    let base_price = commodity.quoted_base_price();
    let drift_pct: f64 = rng.gen_range(-MAX_DRIFT_PCT..=MAX_DRIFT_PCT);
    let price_change = (base_price * drift_pct / 100.0).round();
    let new_price = base_price + price_change;

    let change_direction = if price_change > 0.0 {
        ChangeDirection::Up
    } else if price_change < 0.0 {
        ChangeDirection::Down
    } else {
        ChangeDirection::Stable
    };

    ServerMessage::PriceUpdate {
        timestamp: Utc::now(),
        commodity_id: commodity.id,
        circle_id,
        new_price,
        price_change,
        change_percentage: (drift_pct * 100.0).round() / 100.0,
        change_direction,
        quality: Some("Standard".to_string()),
        arrivals: Some(format!("{} quintals", rng.gen_range(50..=250))),
    }
}
