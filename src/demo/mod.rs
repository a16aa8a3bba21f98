//! Demonstration Call Patterns
//!
//! A small service showing the four request/response shapes the server
//! exposes next to the chat hub:
//!
//! - **Unary**: `POST /api/v1/unary`
//! - **Server streaming**: `GET /api/v1/stream` (Server-Sent Events)
//! - **Client streaming**: `GET /ws/client-stream`
//! - **Bidirectional**: `GET /ws/bidi`

mod messages;
mod service;

pub use messages::{
    StreamType, StreamingRequest, StreamingResponse, UnaryRequest, UnaryResponse, UploadFrame,
};
pub use service::{DemoConfig, DemoService};
