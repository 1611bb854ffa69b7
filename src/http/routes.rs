//! HTTP route definitions

use std::time::Duration;

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::bridge_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/bridge", get(bridge_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    map: String,
    zones: usize,
    volumes: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.link.lock().bridge.status();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime_secs(),
        map: status.map,
        zones: status.zones,
        volumes: status.volumes,
    })
}
