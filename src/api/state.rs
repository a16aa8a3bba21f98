//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Instant;

use crate::demo::{DemoConfig, DemoService};
use crate::hub::{ChatHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat hub serving `/ws/chat`
    pub hub: ChatHub,
    /// Demonstration call patterns
    pub demo: Arc<DemoService>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Wall-clock start time reported by the info endpoints
    pub started_at: DateTime<Local>,
}

impl AppState {
    /// Create state with default hub and demo settings
    pub fn new(config: ApiConfig) -> Self {
        Self::with_parts(config, HubConfig::default(), DemoConfig::default())
    }

    pub fn with_parts(config: ApiConfig, hub_config: HubConfig, demo_config: DemoConfig) -> Self {
        Self {
            hub: ChatHub::new(hub_config),
            demo: Arc::new(DemoService::new(demo_config)),
            config: Arc::new(config),
            start_time: Instant::now(),
            started_at: Local::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Number of connected chat peers
    pub async fn connected_clients(&self) -> usize {
        self.hub.peer_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5003,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
