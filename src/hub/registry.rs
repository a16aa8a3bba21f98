//! Peer Registry
//!
//! The only shared mutable state of the hub: a map from peer id to that
//! peer's outbound sink. The registry holds references to sinks, never the
//! transport itself.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::transport::PeerSink;

/// Hub-assigned identifier for a chat peer
pub type PeerId = String;

/// Point-in-time view of registry membership
pub type Snapshot = Vec<(PeerId, Arc<dyn PeerSink>)>;

/// Concurrent map of connected peers
#[derive(Default)]
pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, Arc<dyn PeerSink>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to the broadcast set
    ///
    /// Ids are generated by the hub, so a duplicate is a programming error
    /// and is reported rather than overwriting the existing sink.
    pub async fn register(&self, id: PeerId, sink: Arc<dyn PeerSink>) -> Result<(), HubError> {
        let mut peers = self.peers.write().await;
        if peers.contains_key(&id) {
            return Err(HubError::DuplicatePeer(id));
        }
        peers.insert(id.clone(), sink);
        drop(peers);

        tracing::debug!(peer_id = %id, "Peer registered");
        Ok(())
    }

    /// Remove a peer. Returns whether the peer was present.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = self.peers.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(peer_id = %id, "Peer unregistered");
        }
        removed
    }

    /// Copy the current membership for one broadcast pass
    pub async fn snapshot(&self) -> Snapshot {
        self.peers
            .read()
            .await
            .iter()
            .map(|(id, sink)| (id.clone(), Arc::clone(sink)))
            .collect()
    }

    /// Number of registered peers
    pub async fn count(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.peers.read().await.contains_key(id)
    }
}

/// Errors raised by the chat hub
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Peer already registered: {0}")]
    DuplicatePeer(PeerId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::messages::ChatMessage;
    use tokio::sync::mpsc;

    fn sink() -> (Arc<dyn PeerSink>, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(tx), rx)
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = sink();

        registry.register("p1".to_string(), tx).await.unwrap();
        assert_eq!(registry.count().await, 1);
        assert!(registry.contains("p1").await);

        assert!(registry.unregister("p1").await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_register_fails() {
        let registry = PeerRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();

        registry.register("p1".to_string(), tx1).await.unwrap();
        let result = registry.register("p1".to_string(), tx2).await;

        assert_eq!(result, Err(HubError::DuplicatePeer("p1".to_string())));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = sink();
        registry.register("p1".to_string(), tx).await.unwrap();

        assert!(registry.unregister("p1").await);
        assert!(!registry.unregister("p1").await);
        assert!(!registry.unregister("never-registered").await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_not_affected_by_later_changes() {
        let registry = PeerRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();
        registry.register("p1".to_string(), tx1).await.unwrap();

        let snapshot = registry.snapshot().await;

        registry.register("p2".to_string(), tx2).await.unwrap();
        registry.unregister("p1").await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "p1");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_registration() {
        let registry = Arc::new(PeerRegistry::new());
        let mut handles = Vec::new();
        let mut receivers = Vec::new();

        for i in 0..50 {
            let (tx, rx) = sink();
            receivers.push(rx);
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.register(format!("p{}", i), tx).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(registry.count().await, 50);
        assert_eq!(registry.snapshot().await.len(), 50);
    }
}
