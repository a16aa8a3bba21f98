//! Broadcast Engine
//!
//! Fans one message out to every peer in a registry snapshot. Each write
//! runs in its own task; a failed write only drops that peer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::messages::{now_timestamp, ChatMessage, MessageKind};
use super::registry::{PeerId, PeerRegistry};

/// Concurrent fan-out over a [`PeerRegistry`]
pub struct Broadcaster {
    registry: Arc<PeerRegistry>,
    passes: AtomicU64,
}

impl Broadcaster {
    pub fn new(registry: Arc<PeerRegistry>) -> Self {
        Self {
            registry,
            passes: AtomicU64::new(0),
        }
    }

    /// Broadcast a message to every registered peer.
    ///
    /// Returns the number of peers in the snapshot the pass was run
    /// against. Peers whose write failed are unregistered once every write
    /// of the pass has finished.
    pub async fn broadcast(&self, sender_id: &str, body: &str, kind: MessageKind) -> usize {
        let message = Arc::new(ChatMessage::format(sender_id, body, kind, now_timestamp()));
        self.passes.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.registry.snapshot().await;
        let recipients = snapshot.len();

        let writes: Vec<_> = snapshot
            .into_iter()
            .map(|(id, sink)| {
                let message = Arc::clone(&message);
                let handle = tokio::spawn(async move { sink.send(&message).await });
                (id, handle)
            })
            .collect();

        let mut failed: Vec<PeerId> = Vec::new();
        for (id, handle) in writes {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(peer_id = %id, error = %e, "Error sending to peer");
                    failed.push(id);
                }
                Err(e) => {
                    tracing::warn!(peer_id = %id, error = %e, "Send task failed");
                    failed.push(id);
                }
            }
        }

        for id in &failed {
            self.registry.unregister(id).await;
        }

        tracing::info!(
            kind = kind.as_str(),
            recipients,
            dropped = failed.len(),
            body = %message.body,
            "Message broadcast"
        );

        recipients
    }

    /// Number of broadcast passes run so far
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }
}
