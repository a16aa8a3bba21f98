//! Session Lifecycle
//!
//! Drives one peer from connection to disconnection:
//! `Starting -> Active -> Closing -> Closed`.
//!
//! Every exit from the read loop (end of input, cancellation, transport
//! error) goes through the same close path, which unregisters the peer and
//! announces the leave to whoever is left. The close path runs exactly once
//! per session, including when the session future is dropped mid-flight.

use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::messages::{join_notice, leave_notice, ClientMessage, MessageKind};
use super::registry::{HubError, PeerId};
use super::transport::{PeerSink, TransportError};
use super::ChatHub;

/// Lifecycle state of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Active,
    Closing,
    Closed,
}

/// Why a session's read loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side cleanly
    Completed,
    /// The cancellation token fired (peer vanished or server shutdown)
    Cancelled,
    /// Reading from the transport failed
    TransportError(String),
}

/// Outcome of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub peer_id: PeerId,
    pub end: SessionEnd,
    pub messages_relayed: u64,
}

/// Per-session bookkeeping; doubles as the drop guard for the close path
struct Session {
    hub: ChatHub,
    peer_id: PeerId,
    state: SessionState,
}

impl Session {
    fn new(hub: ChatHub, peer_id: PeerId) -> Self {
        Self {
            hub,
            peer_id,
            state: SessionState::Starting,
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(
            peer_id = %self.peer_id,
            from = ?self.state,
            to = ?next,
            "Session state change"
        );
        self.state = next;
    }

    /// Run the close path. The work is spawned so it still completes if
    /// this future is dropped while waiting on it.
    async fn close(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        self.transition(SessionState::Closing);

        let task = tokio::spawn(close_peer(self.hub.clone(), self.peer_id.clone()));
        if let Err(e) = task.await {
            tracing::warn!(peer_id = %self.peer_id, error = %e, "Close task failed");
        }

        self.transition(SessionState::Closed);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Dropped while active: the close path never started
        if self.state != SessionState::Active {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(peer_id = %self.peer_id, "Session dropped while active");
                handle.spawn(close_peer(self.hub.clone(), self.peer_id.clone()));
            }
            Err(_) => {
                tracing::warn!(
                    peer_id = %self.peer_id,
                    "Session dropped outside a runtime, peer not cleaned up"
                );
            }
        }
    }
}

async fn close_peer(hub: ChatHub, peer_id: PeerId) {
    hub.registry.unregister(&peer_id).await;

    if hub.registry.count().await > 0 {
        hub.broadcaster
            .broadcast(&peer_id, &leave_notice(&peer_id), MessageKind::System)
            .await;
    }

    tracing::info!(peer_id = %peer_id, "Client disconnected cleanly");
}

impl ChatHub {
    /// Run a chat session to completion.
    ///
    /// The peer is registered under a fresh hub-assigned id, the join is
    /// announced, and every inbound message is broadcast in arrival order
    /// until the stream ends, `cancel` fires, or the transport fails.
    ///
    /// Chat messages are attributed to the `sender_id` declared by the
    /// client; an empty declaration falls back to the hub-assigned id.
    pub async fn run_session<S>(
        &self,
        inbound: S,
        sink: Arc<dyn PeerSink>,
        cancel: CancellationToken,
    ) -> Result<SessionSummary, HubError>
    where
        S: Stream<Item = Result<ClientMessage, TransportError>> + Send,
    {
        let peer_id = self.next_peer_id();
        let mut session = Session::new(self.clone(), peer_id.clone());

        tracing::info!(peer_id = %peer_id, "New client connected");

        if let Err(e) = self.registry.register(peer_id.clone(), sink).await {
            tracing::error!(peer_id = %peer_id, error = %e, "Failed to register peer");
            return Err(e);
        }
        session.transition(SessionState::Active);

        self.broadcaster
            .broadcast(&peer_id, &join_notice(&peer_id), MessageKind::System)
            .await;

        tokio::pin!(inbound);
        let mut messages_relayed = 0u64;

        let end = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionEnd::Cancelled,
                item = inbound.next() => match item {
                    None => break SessionEnd::Completed,
                    Some(Ok(message)) => {
                        let sender = if message.sender_id.is_empty() {
                            peer_id.as_str()
                        } else {
                            message.sender_id.as_str()
                        };

                        tracing::info!(
                            peer_id = %peer_id,
                            sender_id = %sender,
                            body = %message.body,
                            "Message received"
                        );

                        self.broadcaster
                            .broadcast(sender, &message.body, MessageKind::Chat)
                            .await;
                        messages_relayed += 1;
                    }
                    Some(Err(e)) => break SessionEnd::TransportError(e.to_string()),
                },
            }
        };

        match &end {
            SessionEnd::Completed => {
                tracing::info!(peer_id = %peer_id, "Client closed the session");
            }
            SessionEnd::Cancelled => {
                tracing::info!(peer_id = %peer_id, "Client disconnected (cancelled)");
            }
            SessionEnd::TransportError(reason) => {
                tracing::info!(
                    peer_id = %peer_id,
                    reason = %reason,
                    "Client disconnected (connection closed)"
                );
            }
        }

        session.close().await;

        Ok(SessionSummary {
            peer_id,
            end,
            messages_relayed,
        })
    }
}
