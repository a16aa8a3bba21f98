//! Demo Call Pattern Messages
//!
//! Request and response types shared by the four demonstration call
//! patterns (unary, server streaming, client streaming, bidirectional).

use serde::{Deserialize, Serialize};

/// Unary call request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryRequest {
    /// Text to process
    pub message: String,
    /// Caller identifier
    #[serde(default)]
    pub client_id: String,
    /// Client-side send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Unary call response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryResponse {
    pub response: String,
    pub server_id: u32,
    pub timestamp: String,
    /// Server-side processing time in milliseconds
    pub processing_time_ms: u64,
}

/// One item of a streamed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingRequest {
    pub message: String,
    #[serde(default)]
    pub sequence_number: u32,
    #[serde(default)]
    pub client_id: String,
}

/// One item of a streamed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingResponse {
    pub response: String,
    pub sequence_number: u32,
    pub server_id: String,
    pub timestamp: String,
    pub stream_type: StreamType,
}

/// Which call pattern produced a streaming response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    ServerStream,
    ClientStream,
    Bidirectional,
}

/// Frames sent by the client on the client-streaming WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadFrame {
    /// One request of the upload
    Request(StreamingRequest),
    /// No more requests; the server replies with its summary
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_frame_request_deserialize() {
        let json = r#"{"type": "request", "message": "a", "sequence_number": 3, "client_id": "c"}"#;
        let frame: UploadFrame = serde_json::from_str(json).unwrap();
        match frame {
            UploadFrame::Request(req) => {
                assert_eq!(req.message, "a");
                assert_eq!(req.sequence_number, 3);
            }
            _ => panic!("Expected Request"),
        }
    }

    #[test]
    fn test_upload_frame_complete_deserialize() {
        let frame: UploadFrame = serde_json::from_str(r#"{"type": "complete"}"#).unwrap();
        assert_eq!(frame, UploadFrame::Complete);
    }

    #[test]
    fn test_streaming_response_serialize() {
        let resp = StreamingResponse {
            response: "x".to_string(),
            sequence_number: 1,
            server_id: "1001".to_string(),
            timestamp: "t".to_string(),
            stream_type: StreamType::ServerStream,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"stream_type\":\"server_stream\""));
    }

    #[test]
    fn test_unary_request_defaults() {
        let req: UnaryRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.client_id.is_empty());
        assert!(req.timestamp.is_none());
    }
}
