//! API layer for the proxy.
//!
//! This module contains the HTTP handlers, the OpenAI request/response
//! models, and SSE streaming support.

pub mod handlers;
pub mod models;
pub mod streaming;

// Re-export commonly used types
pub use handlers::{chat_completions, health, list_models, metrics_handler, AppState};
pub use models::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, HealthResponse, Message,
    ModelList,
};
pub use streaming::{create_sse_response, sse_frames};
