//! Session Transport Abstraction
//!
//! The hub never touches sockets. A session is handed to it as an inbound
//! stream of [`ClientMessage`](super::ClientMessage) results, an outbound
//! [`PeerSink`], and a cancellation token. Any transport that can provide
//! those three can host a chat session.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::messages::ChatMessage;

/// Outbound delivery channel for a single peer
#[async_trait]
pub trait PeerSink: Send + Sync {
    /// Write one message to the peer.
    ///
    /// An error means the peer can no longer be reached and should be
    /// dropped from the broadcast set.
    async fn send(&self, message: &ChatMessage) -> Result<(), SinkError>;
}

/// Errors writing to a peer sink
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Peer connection closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors reading from a peer session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Read error: {0}")]
    Read(String),
}

#[async_trait]
impl PeerSink for mpsc::UnboundedSender<ChatMessage> {
    async fn send(&self, message: &ChatMessage) -> Result<(), SinkError> {
        mpsc::UnboundedSender::send(self, message.clone()).map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl PeerSink for mpsc::Sender<ChatMessage> {
    async fn send(&self, message: &ChatMessage) -> Result<(), SinkError> {
        mpsc::Sender::send(self, message.clone())
            .await
            .map_err(|_| SinkError::Closed)
    }
}
