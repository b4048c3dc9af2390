use anyhow::Result;
use mandi_live_server::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // Bootstrap the application (config, logging, background tasks, router)
    let app = bootstrap::setup().await?;

    tracing::info!("Server listening on http://{}", app.bind_address);

    let listener = tokio::net::TcpListener::bind(app.socket_addr).await?;
    axum::serve(listener, app.router.into_make_service()).await?;

    Ok(())
}
