//! Chat Hub Message Types
//!
//! Defines the frames exchanged between chat peers and the hub.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Sender id used for hub notices that no peer originated
pub const SYSTEM_SENDER: &str = "system";

/// Timestamp format for broadcast messages (millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Kind of a broadcast message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Hub-generated notification (join, leave, shutdown)
    System,
    /// Message relayed from a peer
    Chat,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::System => "system",
            MessageKind::Chat => "chat",
        }
    }
}

/// Message delivered to every peer in a broadcast pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Peer id of origin, or [`SYSTEM_SENDER`]
    pub sender_id: String,
    /// Formatted payload (`[sender] body` for chat messages)
    pub body: String,
    /// Capture time of the broadcast
    pub timestamp: String,
    /// System or chat
    pub kind: MessageKind,
}

impl ChatMessage {
    /// Build the wire message for one broadcast pass.
    ///
    /// Chat bodies are prefixed with the sender id; system bodies are
    /// passed through unchanged.
    pub fn format(sender_id: &str, body: &str, kind: MessageKind, timestamp: String) -> Self {
        let body = match kind {
            MessageKind::Chat => format!("[{}] {}", sender_id, body),
            MessageKind::System => body.to_string(),
        };

        Self {
            sender_id: sender_id.to_string(),
            body,
            timestamp,
            kind,
        }
    }
}

/// Message received from a peer
///
/// Clients send the same shape they receive; only `sender_id` and `body`
/// are used by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientMessage {
    /// Sender as declared by the client
    #[serde(default)]
    pub sender_id: String,
    /// Message text
    pub body: String,
    /// Client-side send time (ignored by the hub)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ClientMessage {
    pub fn new(sender_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            body: body.into(),
            timestamp: Some(now_timestamp()),
        }
    }
}

/// Current local time in [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn join_notice(peer_id: &str) -> String {
    format!("{} joined the chat!", peer_id)
}

pub fn leave_notice(peer_id: &str) -> String {
    format!("{} left the chat!", peer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_is_prefixed_with_sender() {
        let msg = ChatMessage::format("alice", "hi", MessageKind::Chat, "t".to_string());
        assert_eq!(msg.body, "[alice] hi");
        assert_eq!(msg.sender_id, "alice");
    }

    #[test]
    fn test_system_body_is_verbatim() {
        let msg = ChatMessage::format(
            "ChatUser-1",
            "ChatUser-1 joined the chat!",
            MessageKind::System,
            "t".to_string(),
        );
        assert_eq!(msg.body, "ChatUser-1 joined the chat!");
    }

    #[test]
    fn test_chat_message_serialize() {
        let msg = ChatMessage::format(
            "bob",
            "hello",
            MessageKind::Chat,
            "2026-01-01 10:00:00.123".to_string(),
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"chat\""));
        assert!(json.contains("\"body\":\"[bob] hello\""));
        assert!(json.contains("\"timestamp\":\"2026-01-01 10:00:00.123\""));
    }

    #[test]
    fn test_client_message_ignores_extra_fields() {
        let json = r#"{"sender_id": "alice", "body": "hi", "kind": "chat", "timestamp": "x"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sender_id, "alice");
        assert_eq!(msg.body, "hi");
    }

    #[test]
    fn test_client_message_sender_defaults_to_empty() {
        let msg: ClientMessage = serde_json::from_str(r#"{"body": "hi"}"#).unwrap();
        assert!(msg.sender_id.is_empty());
    }

    #[test]
    fn test_timestamp_has_millis() {
        let ts = now_timestamp();
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(ts.len(), 23);
        assert_eq!(&ts[19..20], ".");
    }
}
