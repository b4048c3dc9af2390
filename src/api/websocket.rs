//! WebSocket connection lifecycle.
//!
//! Each socket gets a registry entry holding the sending half of an
//! unbounded channel; all outbound traffic flows through that channel so
//! broadcasts never block on socket I/O. The socket task is the only reader
//! of the channel: when the registry entry disappears (reaping), the channel
//! closes and the task answers by closing the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::api::AppState;

/// WebSocket upgrade handler.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let conn_id = state.registry.register(tx).await;

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if ws_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    // Registry entry removed out from under us (staleness
                    // eviction): close the socket without ceremony.
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        state.registry.touch(&conn_id).await;
                        state.handler.handle_frame(conn_id, &text).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        state.registry.touch(&conn_id).await;
                        match std::str::from_utf8(&data) {
                            Ok(text) => state.handler.handle_frame(conn_id, text).await,
                            Err(_) => tracing::warn!(
                                connection_id = %conn_id,
                                "dropping non-UTF-8 binary frame"
                            ),
                        }
                    }
                    // Any traffic counts as activity, including keepalives.
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        state.registry.touch(&conn_id).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %conn_id, error = %e, "socket error");
                        break;
                    }
                }
            }
        }
    }

    // No-op when the reaper already removed the entry.
    state.registry.unregister(&conn_id).await;
    state.simulator.stop_if_empty().await;
    tracing::info!(connection_id = %conn_id, "client disconnected");
}
