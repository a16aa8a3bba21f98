//! End-to-end tests against a real server on an ephemeral port.

use chathub::api::{serve_with_shutdown, ApiConfig, AppState};
use chathub::demo::{DemoConfig, StreamType, StreamingRequest, StreamingResponse, UploadFrame};
use chathub::hub::{ChatMessage, ClientMessage, HubConfig, MessageKind};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::with_parts(
            ApiConfig::new("127.0.0.1", addr.port()),
            HubConfig::default(),
            DemoConfig {
                stream_message_count: 3,
                ..DemoConfig::immediate()
            },
        );

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve_with_shutdown(listener, state, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            stop: Some(stop),
            handle,
        }
    }

    fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, path: &str) -> Client {
        let url = format!("ws://{}{}", self.addr, path);
        let (socket, _) = timeout(WAIT, tokio_tungstenite::connect_async(url.as_str()))
            .await
            .expect("connect timed out")
            .unwrap();
        socket
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn next_text(client: &mut Client) -> Option<String> {
    loop {
        match timeout(WAIT, client.next()).await.expect("receive timed out") {
            Some(Ok(Message::Text(text))) => return Some(text),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn next_chat(client: &mut Client) -> ChatMessage {
    let text = next_text(client).await.expect("connection closed");
    serde_json::from_str(&text).unwrap()
}

async fn say(client: &mut Client, sender_id: &str, body: &str) {
    let text = serde_json::to_string(&ClientMessage::new(sender_id, body)).unwrap();
    client.send(Message::Text(text)).await.unwrap();
}

#[tokio::test]
async fn test_two_peers_chat_and_leave() {
    let server = TestServer::start().await;

    let mut a = server.connect("/ws/chat").await;
    let joined = next_chat(&mut a).await;
    assert_eq!(joined.body, "ChatUser-1 joined the chat!");
    assert_eq!(joined.kind, MessageKind::System);

    let mut b = server.connect("/ws/chat").await;
    assert_eq!(next_chat(&mut a).await.body, "ChatUser-2 joined the chat!");
    assert_eq!(next_chat(&mut b).await.body, "ChatUser-2 joined the chat!");

    say(&mut a, "alice", "hello").await;
    for client in [&mut a, &mut b] {
        let msg = next_chat(client).await;
        assert_eq!(msg.body, "[alice] hello");
        assert_eq!(msg.sender_id, "alice");
        assert_eq!(msg.kind, MessageKind::Chat);
    }

    b.close(None).await.unwrap();

    let left = next_chat(&mut a).await;
    assert_eq!(left.body, "ChatUser-2 left the chat!");
    assert_eq!(left.kind, MessageKind::System);
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    let server = TestServer::start().await;

    let mut a = server.connect("/ws/chat").await;
    next_chat(&mut a).await;

    for i in 0..10 {
        say(&mut a, "alice", &format!("m{}", i)).await;
    }
    for i in 0..10 {
        assert_eq!(next_chat(&mut a).await.body, format!("[alice] m{}", i));
    }
}

#[tokio::test]
async fn test_info_counts_connected_clients() {
    let server = TestServer::start().await;
    let mut a = server.connect("/ws/chat").await;
    next_chat(&mut a).await;

    let info: serde_json::Value = reqwest::get(server.http("/info"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info["connected_clients"], 1);
    assert_eq!(info["status"], "Running");
}

#[tokio::test]
async fn test_shutdown_notifies_and_closes_sessions() {
    let mut server = TestServer::start().await;

    let mut a = server.connect("/ws/chat").await;
    next_chat(&mut a).await;

    server.stop();

    let notice = next_chat(&mut a).await;
    assert_eq!(notice.sender_id, "system");
    assert_eq!(notice.body, "Server shutting down");
    assert_eq!(notice.kind, MessageKind::System);

    assert!(next_text(&mut a).await.is_none());
    drop(a);

    timeout(WAIT, server.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_server_stream_over_sse() {
    let server = TestServer::start().await;

    let body = reqwest::Client::new()
        .get(server.http("/api/v1/stream"))
        .query(&[("message", "watch"), ("client_id", "t")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let responses: Vec<StreamingResponse> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[2].response, "Streaming message 3/3 for: watch");
}

#[tokio::test]
async fn test_client_stream_over_websocket() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/client-stream").await;

    for (i, message) in ["a", "b"].iter().enumerate() {
        let frame = UploadFrame::Request(StreamingRequest {
            message: message.to_string(),
            sequence_number: i as u32 + 1,
            client_id: "t".to_string(),
        });
        client
            .send(Message::Text(serde_json::to_string(&frame).unwrap()))
            .await
            .unwrap();
    }
    client
        .send(Message::Text(r#"{"type": "complete"}"#.to_string()))
        .await
        .unwrap();

    let text = next_text(&mut client).await.unwrap();
    let response: StreamingResponse = serde_json::from_str(&text).unwrap();
    assert_eq!(response.response, "Processed 2 client messages: a, b");
    assert_eq!(response.stream_type, StreamType::ClientStream);
}

#[tokio::test]
async fn test_bidirectional_echo_over_websocket() {
    let server = TestServer::start().await;
    let mut client = server.connect("/ws/bidi").await;

    for i in 1..=3u32 {
        let request = StreamingRequest {
            message: format!("ping {}", i),
            sequence_number: i,
            client_id: "t".to_string(),
        };
        client
            .send(Message::Text(serde_json::to_string(&request).unwrap()))
            .await
            .unwrap();

        let text = next_text(&mut client).await.unwrap();
        let response: StreamingResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(response.response, format!("Bidirectional echo: ping {}", i));
        assert_eq!(response.sequence_number, i);
    }
}
