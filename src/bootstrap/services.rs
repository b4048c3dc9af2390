use std::sync::Arc;
use std::time::Duration;

use crate::broadcaster::Broadcaster;
use crate::connection_registry::{ConnectionRegistry, StaleConnectionReaper};
use crate::directory::{InMemoryMarketDirectory, MarketDirectory};
use crate::events::LiveEvents;
use crate::message_handler::MessageHandler;
use crate::models::{Circle, Commodity, CommodityCategory};
use crate::simulator::PriceFeedSimulator;

pub struct ServiceRegistry {
    pub registry: ConnectionRegistry,
    pub broadcaster: Broadcaster,
    pub directory: Arc<InMemoryMarketDirectory>,
    pub simulator: PriceFeedSimulator,
    pub handler: Arc<MessageHandler>,
    pub live_events: LiveEvents,
}

pub async fn setup(config: &crate::config::Config) -> ServiceRegistry {
    let registry = ConnectionRegistry::new();
    let broadcaster = Broadcaster::new(registry.clone());

    // The standalone binary runs against the in-process directory; the
    // surrounding application keeps it current through its handle here.
    let directory = Arc::new(InMemoryMarketDirectory::new());
    seed_directory(&directory).await;

    let simulator = PriceFeedSimulator::new(
        registry.clone(),
        broadcaster.clone(),
        directory.clone() as Arc<dyn MarketDirectory>,
    )
    .with_tick_interval(Duration::from_secs(config.simulator.tick_interval_secs));

    let handler = Arc::new(MessageHandler::new(
        registry.clone(),
        broadcaster.clone(),
        directory.clone() as Arc<dyn MarketDirectory>,
        simulator.clone(),
    ));

    let live_events = LiveEvents::new(broadcaster.clone());

    // Spawn the staleness reaper; it runs for the life of the process.
    let reaper = StaleConnectionReaper::new(registry.clone(), simulator.clone())
        .with_check_interval(Duration::from_secs(config.reaper.check_interval_secs))
        .with_stale_after(chrono::Duration::seconds(
            config.reaper.stale_after_secs as i64,
        ));
    tokio::spawn(async move {
        reaper.run().await;
    });
    tracing::info!(
        check_interval_secs = config.reaper.check_interval_secs,
        stale_after_secs = config.reaper.stale_after_secs,
        "staleness reaper started"
    );
    tracing::info!(
        tick_interval_secs = config.simulator.tick_interval_secs,
        "price feed simulator ready (starts on first identify)"
    );

    ServiceRegistry {
        registry,
        broadcaster,
        directory,
        simulator,
        handler,
        live_events,
    }
}

/// Starter snapshot for the standalone binary, so a fresh server has a
/// market to simulate before any collaborator pushes real data.
async fn seed_directory(directory: &InMemoryMarketDirectory) {
    let commodities = [
        ("Wheat", Some(2150.0), CommodityCategory::Grain),
        ("Basmati Rice", Some(9800.0), CommodityCategory::Grain),
        ("Chana", None, CommodityCategory::Pulse),
        ("Mustard Seed", Some(5650.0), CommodityCategory::Oilseed),
        ("Turmeric", None, CommodityCategory::Spice),
    ];
    for (i, (name, base_price, category)) in commodities.into_iter().enumerate() {
        directory
            .insert_commodity(Commodity {
                id: i as i64 + 1,
                name: name.to_string(),
                base_price,
                category,
            })
            .await;
    }

    let circles = ["Azadpur", "Indore", "Guntur", "Karnal"];
    for (i, name) in circles.into_iter().enumerate() {
        directory
            .insert_circle(Circle {
                id: i as i64 + 1,
                name: name.to_string(),
            })
            .await;
    }
}
