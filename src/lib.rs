//! # Chat Hub
//!
//! A broadcast chat server: every connected peer receives every message
//! sent by any peer, and joins and leaves are announced as system messages.
//! The server also exposes four small demonstration call patterns (unary,
//! server streaming, client streaming, bidirectional echo).
//!
//! ## Modules
//!
//! - [`hub`]: Peer registry, broadcast engine and session lifecycle
//! - [`demo`]: Demonstration call patterns
//! - [`api`]: HTTP / WebSocket server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chathub::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let api_config = config.api_config();
//!
//!     let state = AppState::with_parts(
//!         api_config.clone(),
//!         config.hub_config(),
//!         config.demo_config(),
//!     );
//!     serve(state, &api_config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod demo;
pub mod hub;

pub use api::{build_router, serve, serve_with_shutdown, ApiConfig, ApiError, AppState};

pub use hub::{
    ChatHub, ChatMessage, ClientMessage, HubConfig, HubError, MessageKind, PeerRegistry, PeerSink,
    SessionEnd, SessionSummary, SinkError, TransportError,
};

pub use demo::{DemoConfig, DemoService};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
