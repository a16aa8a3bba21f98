//! Broadcast Chat Hub
//!
//! Multi-client chat over long-lived bidirectional sessions. Every message
//! sent by one peer is fanned out to all connected peers, and joins/leaves
//! are announced as system messages.
//!
//! ## Architecture
//!
//! - **PeerRegistry**: concurrent map of peer id to outbound sink
//! - **Broadcaster**: concurrent fan-out with per-peer failure isolation
//! - **Session**: per-peer lifecycle (register, read loop, cleanup)
//! - **Handler**: adapts an axum WebSocket to the session boundary
//!
//! ## Usage
//!
//! Clients connect to `/ws/chat` and exchange JSON text frames:
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:5003/ws/chat');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({sender_id: 'alice', body: 'hello'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log(msg.kind, msg.body);
//! };
//! ```

mod broadcast;
mod handler;
mod messages;
mod registry;
mod session;
mod transport;

pub use broadcast::Broadcaster;
pub use handler::chat_websocket_handler;
pub use messages::{
    now_timestamp, ChatMessage, ClientMessage, MessageKind, SYSTEM_SENDER, TIMESTAMP_FORMAT,
};
pub use registry::{HubError, PeerId, PeerRegistry, Snapshot};
pub use session::{SessionEnd, SessionState, SessionSummary};
pub use transport::{PeerSink, SinkError, TransportError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Configuration for the chat hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Prefix of hub-assigned peer ids (`{prefix}-{n}`)
    pub id_prefix: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            id_prefix: "ChatUser".to_string(),
        }
    }
}

/// One independent chat hub: a registry, its broadcaster, and the id and
/// shutdown bookkeeping shared by every session.
///
/// Cloning is cheap and every clone refers to the same hub.
#[derive(Clone)]
pub struct ChatHub {
    registry: Arc<PeerRegistry>,
    broadcaster: Arc<Broadcaster>,
    next_id: Arc<AtomicU64>,
    shutdown: CancellationToken,
    config: Arc<HubConfig>,
}

impl ChatHub {
    pub fn new(config: HubConfig) -> Self {
        let registry = Arc::new(PeerRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry)));

        Self {
            registry,
            broadcaster,
            next_id: Arc::new(AtomicU64::new(1)),
            shutdown: CancellationToken::new(),
            config: Arc::new(config),
        }
    }

    fn next_peer_id(&self) -> PeerId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.config.id_prefix, n)
    }

    /// Cancellation token for a new session. Cancelled by the transport
    /// when the peer goes away, and by [`ChatHub::shutdown`] for everyone.
    pub fn session_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Broadcast a message to every connected peer
    pub async fn broadcast(&self, sender_id: &str, body: &str, kind: MessageKind) -> usize {
        self.broadcaster.broadcast(sender_id, body, kind).await
    }

    /// Number of connected peers
    pub async fn peer_count(&self) -> usize {
        self.registry.count().await
    }

    /// Number of broadcast passes run so far
    pub fn broadcast_passes(&self) -> u64 {
        self.broadcaster.passes()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Notify every peer that the server is going away and end all sessions
    pub async fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }

        tracing::info!("Chat hub shutting down");
        self.broadcaster
            .broadcast(SYSTEM_SENDER, "Server shutting down", MessageKind::System)
            .await;
        self.shutdown.cancel();
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.id_prefix, "ChatUser");
    }

    #[test]
    fn test_peer_ids_are_sequential_and_unique() {
        let hub = ChatHub::new(HubConfig {
            id_prefix: "Peer".to_string(),
        });
        assert_eq!(hub.next_peer_id(), "Peer-1");
        assert_eq!(hub.next_peer_id(), "Peer-2");

        let clone = hub.clone();
        assert_eq!(clone.next_peer_id(), "Peer-3");
    }

    #[test]
    fn test_hubs_are_independent() {
        let a = ChatHub::default();
        let b = ChatHub::default();
        assert_eq!(a.next_peer_id(), "ChatUser-1");
        assert_eq!(b.next_peer_id(), "ChatUser-1");
    }

    #[tokio::test]
    async fn test_session_tokens_follow_shutdown() {
        let hub = ChatHub::default();
        let token = hub.session_token();
        assert!(!token.is_cancelled());

        hub.shutdown().await;

        assert!(token.is_cancelled());
        assert!(hub.is_shutting_down());
    }

    #[tokio::test]
    async fn test_cancelling_one_session_leaves_others() {
        let hub = ChatHub::default();
        let first = hub.session_token();
        let second = hub.session_token();

        first.cancel();

        assert!(!second.is_cancelled());
        assert!(!hub.is_shutting_down());
    }
}
