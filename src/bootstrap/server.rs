use anyhow::Result;
use std::net::SocketAddr;

use crate::api::{create_router, AppState};
use crate::bootstrap::{services::ServiceRegistry, Application};

pub fn setup(config: crate::config::Config, services: ServiceRegistry) -> Result<Application> {
    let allowed_origins = config.allowed_origins();
    let cors_disabled = config.cors.disable;

    let app_state = AppState {
        registry: services.registry,
        handler: services.handler,
        simulator: services.simulator,
        allowed_origins: allowed_origins.clone(),
        cors_disabled,
    };

    if cors_disabled {
        tracing::warn!("CORS is DISABLED in config - all origins will be allowed!");
    } else {
        tracing::info!("CORS origins: {:?}", allowed_origins);
    }

    let router = create_router(app_state);

    let bind_address = config.server_address();
    let socket_addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind_address, e))?;

    Ok(Application {
        router,
        bind_address,
        socket_addr,
    })
}
