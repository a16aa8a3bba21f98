//! Demo Call Pattern Service
//!
//! Transport-independent implementations of the four call patterns. The
//! HTTP and WebSocket routes only move these values on and off the wire.

use futures_util::stream::{self, Stream, StreamExt};
use std::time::{Duration, Instant};

use super::messages::{StreamType, StreamingRequest, StreamingResponse, UnaryRequest, UnaryResponse};
use crate::hub::now_timestamp;

/// Timing and identity of the demo service
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub server_id: u32,
    /// Simulated work per unary call
    pub unary_delay_ms: u64,
    /// Number of messages in a server stream
    pub stream_message_count: u32,
    /// Pause between server-stream messages
    pub stream_interval_ms: u64,
    /// Simulated work per client-stream item
    pub client_stream_delay_ms: u64,
    /// Pause after each bidirectional echo
    pub bidi_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            server_id: 1001,
            unary_delay_ms: 100,
            stream_message_count: 5,
            stream_interval_ms: 1000,
            client_stream_delay_ms: 200,
            bidi_delay_ms: 500,
        }
    }
}

impl DemoConfig {
    /// Config with every delay set to zero
    pub fn immediate() -> Self {
        Self {
            unary_delay_ms: 0,
            stream_interval_ms: 0,
            client_stream_delay_ms: 0,
            bidi_delay_ms: 0,
            ..Self::default()
        }
    }
}

/// The four demonstration call patterns
#[derive(Debug, Clone, Default)]
pub struct DemoService {
    config: DemoConfig,
}

impl DemoService {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// One request, one response
    pub async fn unary(&self, request: UnaryRequest) -> UnaryResponse {
        let started = Instant::now();
        tracing::info!(
            message = %request.message,
            client_id = %request.client_id,
            "Unary call received"
        );

        sleep_ms(self.config.unary_delay_ms).await;

        let response = UnaryResponse {
            response: format!("Hello {} ! Processed by server.", request.message),
            server_id: self.config.server_id,
            timestamp: now_timestamp(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            response = %response.response,
            processing_time_ms = response.processing_time_ms,
            "Unary response sent"
        );
        response
    }

    /// One request, a sequence of responses.
    ///
    /// The stream is lazy: dropping it stops production immediately, which
    /// is how a disconnecting consumer cancels the call.
    pub fn server_stream(
        &self,
        request: StreamingRequest,
    ) -> impl Stream<Item = StreamingResponse> + Send + 'static {
        tracing::info!(
            message = %request.message,
            client_id = %request.client_id,
            "Server streaming started"
        );

        let count = self.config.stream_message_count;
        let interval = self.config.stream_interval_ms;
        let server_id = self.config.server_id.to_string();

        stream::unfold(1u32, move |i| {
            let message = request.message.clone();
            let server_id = server_id.clone();
            async move {
                if i > count {
                    tracing::info!("Server streaming completed");
                    return None;
                }
                if i > 1 {
                    sleep_ms(interval).await;
                }

                let response = StreamingResponse {
                    response: format!("Streaming message {}/{} for: {}", i, count, message),
                    sequence_number: i,
                    server_id,
                    timestamp: now_timestamp(),
                    stream_type: StreamType::ServerStream,
                };
                tracing::debug!(sequence = i, "Server streaming sent");
                Some((response, i + 1))
            }
        })
    }

    /// A sequence of requests, one summary response
    pub async fn client_stream<S>(&self, requests: S) -> StreamingResponse
    where
        S: Stream<Item = StreamingRequest> + Send,
    {
        tracing::info!("Client streaming started");
        tokio::pin!(requests);

        let mut messages = Vec::new();
        while let Some(request) = requests.next().await {
            tracing::debug!(
                message = %request.message,
                sequence = request.sequence_number,
                client_id = %request.client_id,
                "Client streaming received"
            );
            messages.push(request.message);
            sleep_ms(self.config.client_stream_delay_ms).await;
        }

        let response = StreamingResponse {
            response: format!(
                "Processed {} client messages: {}",
                messages.len(),
                messages.join(", ")
            ),
            sequence_number: messages.len() as u32,
            server_id: self.config.server_id.to_string(),
            timestamp: now_timestamp(),
            stream_type: StreamType::ClientStream,
        };

        tracing::info!(count = messages.len(), "Client streaming response sent");
        response
    }

    /// Answer one item of a bidirectional stream
    pub fn echo(&self, request: &StreamingRequest) -> StreamingResponse {
        tracing::debug!(
            message = %request.message,
            sequence = request.sequence_number,
            "Bidirectional streaming received"
        );

        StreamingResponse {
            response: format!("Bidirectional echo: {}", request.message),
            sequence_number: request.sequence_number,
            server_id: self.config.server_id.to_string(),
            timestamp: now_timestamp(),
            stream_type: StreamType::Bidirectional,
        }
    }

    /// Pause applied after each echo
    pub async fn echo_pause(&self) {
        sleep_ms(self.config.bidi_delay_ms).await;
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str, sequence_number: u32) -> StreamingRequest {
        StreamingRequest {
            message: message.to_string(),
            sequence_number,
            client_id: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unary() {
        let service = DemoService::new(DemoConfig::immediate());
        let response = service
            .unary(UnaryRequest {
                message: "World".to_string(),
                client_id: "1".to_string(),
                timestamp: None,
            })
            .await;

        assert_eq!(response.response, "Hello World ! Processed by server.");
        assert_eq!(response.server_id, 1001);
    }

    #[tokio::test]
    async fn test_server_stream_yields_configured_count() {
        let service = DemoService::new(DemoConfig {
            stream_message_count: 3,
            ..DemoConfig::immediate()
        });

        let responses: Vec<_> = service.server_stream(request("ping", 1)).collect().await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].response, "Streaming message 1/3 for: ping");
        assert_eq!(responses[2].sequence_number, 3);
        assert!(responses
            .iter()
            .all(|r| r.stream_type == StreamType::ServerStream));
    }

    #[tokio::test]
    async fn test_server_stream_stops_when_dropped() {
        let service = DemoService::new(DemoConfig::default());
        let mut stream = Box::pin(service.server_stream(request("x", 1)));

        let first = stream.next().await.unwrap();
        assert_eq!(first.sequence_number, 1);
        drop(stream);
    }

    #[tokio::test]
    async fn test_client_stream_summary() {
        let service = DemoService::new(DemoConfig::immediate());
        let requests = stream::iter(vec![request("a", 1), request("b", 2), request("c", 3)]);

        let response = service.client_stream(requests).await;

        assert_eq!(response.response, "Processed 3 client messages: a, b, c");
        assert_eq!(response.sequence_number, 3);
        assert_eq!(response.stream_type, StreamType::ClientStream);
    }

    #[tokio::test]
    async fn test_client_stream_empty() {
        let service = DemoService::new(DemoConfig::immediate());
        let response = service.client_stream(stream::empty()).await;
        assert_eq!(response.response, "Processed 0 client messages: ");
        assert_eq!(response.sequence_number, 0);
    }

    #[test]
    fn test_echo() {
        let service = DemoService::default();
        let response = service.echo(&request("hello", 7));
        assert_eq!(response.response, "Bidirectional echo: hello");
        assert_eq!(response.sequence_number, 7);
        assert_eq!(response.stream_type, StreamType::Bidirectional);
    }
}
