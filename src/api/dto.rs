//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::demo::StreamingRequest;

pub const SERVER_NAME: &str = "Chat Hub Server";

/// Features advertised by `/info` and `/api/v1/server-info`
pub const FEATURES: [&str; 5] = [
    "Unary",
    "Server Streaming",
    "Client Streaming",
    "Bidirectional Streaming",
    "Chat Hub",
];

// ============================================
// INFO DTOs
// ============================================

/// GET /info response
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub server_name: String,
    pub version: String,
    pub start_time: String,
    /// Always "Running" while the server answers
    pub status: String,
    pub connected_clients: usize,
    pub features: Vec<String>,
}

/// GET /api/v1/server-info response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerInfoResponse {
    pub server_name: String,
    pub version: String,
    pub start_time: String,
    pub active_connections: usize,
    pub supported_features: Vec<String>,
}

// ============================================
// STREAM DTOs
// ============================================

/// Query parameters of the server-streaming endpoint
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub message: String,
    #[serde(default)]
    pub client_id: String,
}

impl From<StreamParams> for StreamingRequest {
    fn from(params: StreamParams) -> Self {
        StreamingRequest {
            message: params.message,
            sequence_number: 1,
            client_id: params.client_id,
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or shutting_down
    pub status: String,
    /// Chat hub status: ok or closing
    pub hub: String,
    /// Connected chat peers
    pub connected_clients: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
