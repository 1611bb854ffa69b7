//! WebSocket upgrade handler for the game server bridge

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::{AppState, BridgeLink};
use crate::ws::protocol::{HostEnvelope, PluginBatch};

/// Query parameters for the bridge connection
#[derive(Debug, Deserialize)]
pub struct BridgeQuery {
    /// Shared secret from `BRIDGE_TOKEN`
    pub token: String,
}

/// WebSocket upgrade handler
pub async fn bridge_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<BridgeQuery>,
    State(state): State<AppState>,
) -> Response {
    if query.token != state.config.bridge_token {
        warn!("Bridge connection rejected: bad token");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    if state.link.lock().is_attached() {
        warn!("Bridge connection rejected: a game server is already attached");
        return (StatusCode::CONFLICT, "Already attached").into_response();
    }

    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "Bridge upgrade accepted");
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: Uuid, state: AppState) {
    let attached = state.link.lock().attach(session_id);
    let Some(mut batch_rx) = attached else {
        warn!(session_id = %session_id, "Lost the race to attach, closing");
        return;
    };

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Spawn writer task: batches -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(batch) = batch_rx.recv().await {
            if let Err(e) = send_batch(&mut ws_sink, &batch).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> zone runtime
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<HostEnvelope>(&text) {
                Ok(envelope) => {
                    if let Err(e) = apply_frame(state.link.clone(), envelope).await {
                        error!(session_id = %session_id, error = %e, "Frame handling panicked");
                        break;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to parse host frame");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session_id = %session_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Game server initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
    state.link.lock().detach(session_id);

    info!(session_id = %session_id, "Game server disconnected");
}

/// Apply a frame off the async workers; zone commands may read or write
/// zone files while holding the lock
pub async fn apply_frame(
    link: Arc<Mutex<BridgeLink>>,
    envelope: HostEnvelope,
) -> Result<(), tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || link.lock().handle(envelope)).await
}

/// Send a batch over WebSocket
async fn send_batch(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    batch: &PluginBatch,
) -> Result<(), String> {
    let json = serde_json::to_string(batch).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
