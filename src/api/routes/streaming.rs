//! Streaming Routes
//!
//! - GET /api/v1/stream - Server streaming as Server-Sent Events
//! - GET /ws/client-stream - Client streaming over WebSocket
//! - GET /ws/bidi - Bidirectional echo over WebSocket

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        Response,
    },
};
use futures_util::stream::{self, Stream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::api::dto::StreamParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::demo::{DemoService, StreamingRequest, StreamingResponse, UploadFrame};

/// GET /api/v1/stream?message=...&client_id=...
///
/// Each response is one `message` event with a JSON payload. The stream
/// ends after the last message; a client disconnect drops it early.
pub async fn server_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamParams>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    if params.message.trim().is_empty() {
        return Err(ApiError::Validation("message cannot be empty".to_string()));
    }

    let events = state
        .demo
        .server_stream(params.into())
        .map(|response| Event::default().event("message").json_data(response));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// GET /ws/client-stream
pub async fn client_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let demo = Arc::clone(&state.demo);
    ws.on_upgrade(move |socket| handle_client_stream(socket, demo))
}

async fn handle_client_stream(socket: WebSocket, demo: Arc<DemoService>) {
    let (mut sender, receiver) = socket.split();

    let response = demo.client_stream(upload_requests(receiver)).await;
    if let Err(e) = send_json(&mut sender, &response).await {
        tracing::debug!(error = %e, "Client stream response not delivered");
    }
    let _ = sender.send(Message::Close(None)).await;
}

/// Requests of one upload, ending at the `complete` frame or when the
/// socket closes.
fn upload_requests(
    receiver: futures_util::stream::SplitStream<WebSocket>,
) -> impl Stream<Item = StreamingRequest> + Send {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<UploadFrame>(&text) {
                    Ok(UploadFrame::Request(request)) => return Some((request, receiver)),
                    Ok(UploadFrame::Complete) => return None,
                    Err(e) => tracing::debug!(error = %e, "Invalid upload frame"),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Client stream read failed");
                    return None;
                }
            }
        }
    })
}

/// GET /ws/bidi
pub async fn bidi_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let demo = Arc::clone(&state.demo);
    ws.on_upgrade(move |socket| handle_bidi(socket, demo))
}

async fn handle_bidi(socket: WebSocket, demo: Arc<DemoService>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("Bidirectional streaming started");

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "Bidirectional read failed");
                break;
            }
        };

        let request: StreamingRequest = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Invalid bidirectional frame");
                continue;
            }
        };

        let response = demo.echo(&request);
        if send_json(&mut sender, &response).await.is_err() {
            break;
        }
        demo.echo_pause().await;
    }

    tracing::info!("Bidirectional streaming completed");
}

async fn send_json<S>(sender: &mut S, response: &StreamingResponse) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(response).map_err(axum::Error::new)?;
    sender.send(Message::Text(text)).await
}
