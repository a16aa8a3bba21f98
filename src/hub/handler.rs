//! Chat WebSocket Handler
//!
//! Adapts an axum WebSocket to the hub's session boundary: an inbound
//! stream of client messages, an outbound channel sink, and a cancellation
//! token raised when the socket can no longer be written to.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::{self, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::messages::{ChatMessage, ClientMessage};
use super::transport::TransportError;
use super::ChatHub;
use crate::api::AppState;

/// WebSocket upgrade handler for `/ws/chat`
pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Run one chat session over an established WebSocket
async fn handle_socket(socket: WebSocket, hub: ChatHub) {
    let (mut sender, receiver) = socket.split();

    // Outbound queue drained into the socket by a dedicated task
    let (tx, mut rx) = mpsc::unbounded_channel::<ChatMessage>();
    let cancel = hub.session_token();

    let send_cancel = cancel.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!("WebSocket send failed, cancelling session");
                        send_cancel.cancel();
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    match hub.run_session(inbound_messages(receiver), Arc::new(tx), cancel).await {
        Ok(summary) => {
            tracing::debug!(
                peer_id = %summary.peer_id,
                end = ?summary.end,
                relayed = summary.messages_relayed,
                "Chat session finished"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Chat session failed to start");
        }
    }

    // The registry dropped its sink; the queue closes once in-flight
    // broadcasts release theirs.
    if let Err(e) = send_task.await {
        tracing::warn!(error = %e, "WebSocket send task failed");
    }
}

/// Turn WebSocket frames into the hub's inbound message stream.
///
/// Text frames are parsed as [`ClientMessage`]; malformed frames are
/// skipped. A close frame ends the stream.
fn inbound_messages(
    receiver: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<ClientMessage, TransportError>> + Send {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => return Some((Ok(message), receiver)),
                    Err(e) => {
                        tracing::debug!(error = %e, text = %text, "Invalid chat message");
                    }
                },
                Ok(Message::Close(_)) => return None,
                // Axum answers pings itself; binary frames are not part of the protocol
                Ok(_) => {}
                Err(e) => {
                    return Some((Err(TransportError::Read(e.to_string())), receiver));
                }
            }
        }
    })
}
