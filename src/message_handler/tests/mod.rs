
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use axum::extract::ws::Message as WsMessage;

use crate::broadcaster::Broadcaster;
use crate::connection_registry::ConnectionRegistry;
use crate::directory::InMemoryMarketDirectory;
use crate::message_handler::MessageHandler;
use crate::models::ConnectionId;
use crate::simulator::PriceFeedSimulator;

/// Wire up a handler over fresh components; the simulator interval is long
/// enough that only its immediate first tick can ever fire during a test.
pub(super) struct Harness {
    pub registry: ConnectionRegistry,
    pub directory: Arc<InMemoryMarketDirectory>,
    pub simulator: PriceFeedSimulator,
    pub handler: MessageHandler,
}

pub(super) fn harness() -> Harness {
    let registry = ConnectionRegistry::new();
    let broadcaster = Broadcaster::new(registry.clone());
    let directory = Arc::new(InMemoryMarketDirectory::new());
    let simulator = PriceFeedSimulator::new(
        registry.clone(),
        broadcaster.clone(),
        directory.clone(),
    )
    .with_tick_interval(Duration::from_secs(3600));
    let handler = MessageHandler::new(
        registry.clone(),
        broadcaster,
        directory.clone(),
        simulator.clone(),
    );

    Harness {
        registry,
        directory,
        simulator,
        handler,
    }
}

pub(super) async fn connect_client(
    registry: &ConnectionRegistry,
) -> (ConnectionId, mpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = registry.register(tx).await;
    (id, rx)
}

pub(super) fn circle_set(ids: &[i64]) -> HashSet<i64> {
    ids.iter().copied().collect()
}
