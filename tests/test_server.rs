// test_server.rs
//
// Test helper for spawning mandi-live-server instances for E2E testing.
// Provides automatic port allocation and server lifecycle management.

use anyhow::Result;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use mandi_live_server::{
    api::{create_router, AppState},
    broadcaster::Broadcaster,
    connection_registry::{ConnectionRegistry, StaleConnectionReaper},
    directory::{InMemoryMarketDirectory, MarketDirectory},
    events::LiveEvents,
    message_handler::MessageHandler,
    models::{Circle, Commodity, CommodityCategory},
    simulator::PriceFeedSimulator,
};

/// Test server instance on a dynamically allocated port.
#[allow(dead_code)]
pub struct TestServer {
    pub port: u16,
    pub registry: ConnectionRegistry,
    pub directory: Arc<InMemoryMarketDirectory>,
    pub simulator: PriceFeedSimulator,
    pub live_events: LiveEvents,
    server_handle: Option<JoinHandle<()>>,
    reaper_handle: Option<JoinHandle<()>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Start a test server with a fast simulator tick and no reaper sweeps
    /// during the test window.
    pub async fn start() -> Result<Self> {
        Self::start_with(Duration::from_millis(100), Duration::from_secs(3600), 300).await
    }

    /// Start a test server with explicit simulator/reaper timing.
    pub async fn start_with(
        tick_interval: Duration,
        reaper_interval: Duration,
        stale_after_secs: i64,
    ) -> Result<Self> {
        // Bind to port 0 to get an available port immediately (avoiding
        // TOCTOU races with a separate find-port step).
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();

        let registry = ConnectionRegistry::new();
        let broadcaster = Broadcaster::new(registry.clone());

        let directory = Arc::new(InMemoryMarketDirectory::new());
        directory
            .insert_commodity(Commodity {
                id: 1,
                name: "Wheat".to_string(),
                base_price: Some(2500.0),
                category: CommodityCategory::Grain,
            })
            .await;
        directory
            .insert_circle(Circle {
                id: 10,
                name: "Azadpur".to_string(),
            })
            .await;

        let simulator = PriceFeedSimulator::new(
            registry.clone(),
            broadcaster.clone(),
            directory.clone() as Arc<dyn MarketDirectory>,
        )
        .with_tick_interval(tick_interval);

        let handler = Arc::new(MessageHandler::new(
            registry.clone(),
            broadcaster.clone(),
            directory.clone() as Arc<dyn MarketDirectory>,
            simulator.clone(),
        ));

        let live_events = LiveEvents::new(broadcaster.clone());

        let reaper = StaleConnectionReaper::new(registry.clone(), simulator.clone())
            .with_check_interval(reaper_interval)
            .with_stale_after(chrono::Duration::seconds(stale_after_secs));
        let reaper_handle = tokio::spawn(async move {
            reaper.run().await;
        });

        let state = AppState {
            registry: registry.clone(),
            handler,
            simulator: simulator.clone(),
            allowed_origins: vec![],
            cors_disabled: true, // Disable CORS for tests
        };
        let app = create_router(state);

        // Spawn HTTP server using the pre-bound listener
        let server_handle = tokio::spawn(async move {
            listener
                .set_nonblocking(true)
                .expect("Failed to set non-blocking");
            let listener = tokio::net::TcpListener::from_std(listener)
                .expect("Failed to convert listener");

            axum::serve(listener, app).await.expect("HTTP server failed");
        });

        // Wait a bit for the server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(TestServer {
            port,
            registry,
            directory,
            simulator,
            live_events,
            server_handle: Some(server_handle),
            reaper_handle: Some(reaper_handle),
        })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Explicitly shut the test server down and stop its background tasks.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.reaper_handle.take() {
            handle.abort();
        }
        self.simulator.stop_if_empty().await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.reaper_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_starts() {
        let server = TestServer::start()
            .await
            .expect("Failed to start test server");
        assert!(server.port > 0);
        assert_eq!(server.registry.count().await, 0);
        server.shutdown().await;
    }
}
