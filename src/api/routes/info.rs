//! Info Routes
//!
//! - GET / - Plain-text banner
//! - GET /info - Server summary
//! - GET /api/v1/server-info - Demo server summary

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{InfoResponse, ServerInfoResponse, FEATURES, SERVER_NAME};
use crate::api::state::AppState;
use crate::hub::TIMESTAMP_FORMAT;

/// GET /
pub async fn banner() -> &'static str {
    "Chat Hub Server is running. Connect a WebSocket client to /ws/chat."
}

/// GET /info
pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        server_name: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: start_time(&state),
        status: "Running".to_string(),
        connected_clients: state.connected_clients().await,
        features: features(),
    })
}

/// GET /api/v1/server-info
pub async fn server_info(State(state): State<Arc<AppState>>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        server_name: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: start_time(&state),
        active_connections: state.connected_clients().await,
        supported_features: features(),
    })
}

fn start_time(state: &AppState) -> String {
    state.started_at.format(TIMESTAMP_FORMAT).to_string()
}

fn features() -> Vec<String> {
    FEATURES.iter().map(|f| f.to_string()).collect()
}
