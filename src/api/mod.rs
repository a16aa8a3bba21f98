//! Chat Hub HTTP / WebSocket API
//!
//! HTTP layer for the chat hub and the demo call patterns, built with Axum.
//!
//! # Endpoints
//!
//! ## Info
//! - `GET /` - Plain-text banner
//! - `GET /info` - Server summary with connected client count
//! - `GET /api/v1/server-info` - Demo server summary
//!
//! ## Demo call patterns
//! - `POST /api/v1/unary` - Unary call
//! - `GET /api/v1/stream` - Server streaming (Server-Sent Events)
//! - `GET /ws/client-stream` - Client streaming
//! - `GET /ws/bidi` - Bidirectional echo
//!
//! ## Chat
//! - `GET /ws/chat` - Broadcast chat session
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use chathub::api::{serve, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(config.clone());
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::hub::chat_websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/server-info", get(routes::info::server_info))
        .route("/unary", post(routes::unary::unary_call))
        .route("/stream", get(routes::streaming::server_stream));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let ws_routes = Router::new()
        .route("/chat", get(chat_websocket_handler))
        .route("/client-stream", get(routes::streaming::client_stream_handler))
        .route("/bidi", get(routes::streaming::bidi_handler));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::info::banner))
        .route("/info", get(routes::info::info))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .nest("/ws", ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the server and run until Ctrl+C or SIGTERM
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `signal` resolves.
///
/// When the signal fires, the hub tells every peer the server is going
/// away and ends their sessions before the listener stops.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    signal: F,
) -> Result<(), ApiError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let hub = state.hub.clone();
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Chat hub listening on {}", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            hub.shutdown().await;
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Chat hub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
