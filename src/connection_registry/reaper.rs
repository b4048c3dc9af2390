//! Periodic eviction of connections with no inbound activity.
//!
//! Reaping is routine garbage collection, not an error path: the evicted
//! client gets no farewell message and simply reconnects and re-identifies.
//! This sweep is the only way a connection leaves the registry without a
//! client-initiated close.

use std::time::Duration;

use crate::connection_registry::ConnectionRegistry;
use crate::simulator::PriceFeedSimulator;

/// Sweep cadence.
const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
/// Inactivity threshold past which a connection is considered abandoned.
const DEFAULT_STALE_AFTER_SECS: i64 = 300;

pub struct StaleConnectionReaper {
    registry: ConnectionRegistry,
    simulator: PriceFeedSimulator,
    check_interval: Duration,
    stale_after: chrono::Duration,
}

impl StaleConnectionReaper {
    pub fn new(registry: ConnectionRegistry, simulator: PriceFeedSimulator) -> Self {
        Self {
            registry,
            simulator,
            check_interval: DEFAULT_CHECK_INTERVAL,
            stale_after: chrono::Duration::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }

    /// Set a custom sweep interval (useful for tests).
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set a custom inactivity threshold (useful for tests).
    pub fn with_stale_after(mut self, stale_after: chrono::Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Run for the lifetime of the process; the reaper interval is never
    /// cancelled.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.check_interval);
        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    /// Perform a single sweep (public for testing).
    pub async fn sweep(&self) {
        let now = chrono::Utc::now();
        let cutoff = now - self.stale_after;
        let reaped = self.registry.reap_stale(cutoff).await;

        if reaped.is_empty() {
            return;
        }

        for conn in &reaped {
            tracing::info!(
                connection_id = %conn.id,
                user_id = ?conn.user_id,
                idle_secs = (now - conn.last_activity).num_seconds(),
                "evicted stale connection"
            );
        }

        // The sweep may have emptied the registry.
        self.simulator.stop_if_empty().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::Broadcaster;
    use crate::directory::InMemoryMarketDirectory;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn reaper_for(registry: &ConnectionRegistry) -> (StaleConnectionReaper, PriceFeedSimulator) {
        let simulator = PriceFeedSimulator::new(
            registry.clone(),
            Broadcaster::new(registry.clone()),
            Arc::new(InMemoryMarketDirectory::new()),
        )
        .with_tick_interval(Duration::from_secs(3600));
        let reaper = StaleConnectionReaper::new(registry.clone(), simulator.clone());
        (reaper, simulator)
    }

    #[tokio::test]
    async fn test_sweep_respects_staleness_boundary() {
        let registry = ConnectionRegistry::new();
        let (reaper, _simulator) = reaper_for(&registry);

        let (tx_stale, _rx_stale) = mpsc::unbounded_channel();
        let stale = registry.register(tx_stale).await;
        registry.backdate(&stale, 301).await;

        let (tx_fresh, _rx_fresh) = mpsc::unbounded_channel();
        let fresh = registry.register(tx_fresh).await;
        registry.backdate(&fresh, 299).await;

        reaper.sweep().await;

        assert!(registry.get(&stale).await.is_none());
        assert!(registry.get(&fresh).await.is_some());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_closes_outbound_channel() {
        let registry = ConnectionRegistry::new();
        let (reaper, _simulator) = reaper_for(&registry);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = registry.register(tx).await;
        registry.backdate(&conn, 600).await;

        reaper.sweep().await;

        // The socket task observes the closed channel and shuts the socket.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_stops_simulator_when_registry_empties() {
        let registry = ConnectionRegistry::new();
        let (reaper, simulator) = reaper_for(&registry);

        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = registry.register(tx).await;
        simulator.start_if_needed().await;
        assert!(simulator.is_running().await);

        registry.backdate(&conn, 600).await;
        reaper.sweep().await;

        assert_eq!(registry.count().await, 0);
        assert!(!simulator.is_running().await);
    }

    #[tokio::test]
    async fn test_sweep_keeps_simulator_while_clients_remain() {
        let registry = ConnectionRegistry::new();
        let (reaper, simulator) = reaper_for(&registry);

        let (tx_stale, _rx_stale) = mpsc::unbounded_channel();
        let stale = registry.register(tx_stale).await;
        registry.backdate(&stale, 600).await;

        let (tx_live, _rx_live) = mpsc::unbounded_channel();
        registry.register(tx_live).await;

        simulator.start_if_needed().await;
        reaper.sweep().await;

        assert_eq!(registry.count().await, 1);
        assert!(simulator.is_running().await);
    }
}
