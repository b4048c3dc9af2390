//! HTTP surface: the WebSocket endpoint clients attach to, plus a health
//! probe. Includes CORS configuration and request tracing.

mod websocket;

pub use websocket::websocket_handler;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::connection_registry::ConnectionRegistry;
use crate::message_handler::MessageHandler;
use crate::simulator::PriceFeedSimulator;

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub handler: Arc<MessageHandler>,
    pub simulator: PriceFeedSimulator,
    pub allowed_origins: Vec<String>,
    pub cors_disabled: bool,
}

pub fn create_router(state: AppState) -> Router {
    let cors = if state.cors_disabled {
        tracing::warn!("CORS is DISABLED - allowing all origins. Development use only!");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(
                state
                    .allowed_origins
                    .iter()
                    .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(tracing::Level::DEBUG)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "connections": state.registry.count().await,
        "simulator_running": state.simulator.is_running().await,
    }))
}
