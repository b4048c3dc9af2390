use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;

pub mod server;
pub mod services;

pub struct Application {
    pub router: Router,
    pub bind_address: String,
    pub socket_addr: SocketAddr,
}

pub async fn setup() -> Result<Application> {
    // 1. Load configuration
    let config = load_config();

    // 2. Setup logging
    crate::logging::init(&config.logging);

    tracing::info!("Starting Mandi Live Server...");

    // 3. Setup services & background tasks
    let service_registry = services::setup(&config).await;

    // 4. Setup server (router + bind address)
    server::setup(config, service_registry)
}

fn load_config() -> crate::config::Config {
    use crate::config::Config;

    // Determine config directory
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| ".".to_string())
    });
    let config_base = format!("{}/config", config_dir);

    match Config::from_file(&config_base) {
        Ok(cfg) => {
            eprintln!("Configuration loaded from {}", config_base);
            cfg
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {}, using defaults", e);
            Config::default()
        }
    }
}
