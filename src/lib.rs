//! OpenAI-compatible proxy for the Anakin chatbot API.
//!
//! Accepts OpenAI Chat Completions requests, forwards the conversation to an
//! Anakin chatbot app, and reshapes the answer (plain JSON or a server-sent
//! event stream) back into the OpenAI wire format.
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging context, metrics, middleware
//! - [`services`]: model resolution and the upstream HTTP client
//! - [`transformer`]: request flattening, response translation, SSE framing
//! - [`api`]: HTTP handlers and OpenAI wire models
//!
//! # Configuration
//!
//! The server reads a YAML file from `CONFIG_PATH` (default `config.yaml`):
//!
//! ```yaml
//! server:
//!   port: 18000
//! upstream:
//!   base_url: https://api.anakin.ai
//! models:
//!   gpt-4o: 12345
//! ```
//!
//! Optional environment overrides: `HOST`, `PORT`, `VERIFY_SSL`,
//! `REQUEST_TIMEOUT_SECS`, `ANAKIN_BASE_URL`.

pub mod api;
pub mod core;
pub mod services;
pub mod transformer;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Re-export commonly used types for convenience
pub use api::{AppState, ChatCompletionRequest, ChatCompletionResponse};
pub use crate::core::{AppConfig, AppError, Result};
pub use services::{AnakinClient, ModelResolver};

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(api::chat_completions))
        .route("/chat/completions", post(api::chat_completions))
        .route("/v1/models", get(api::list_models))
        .route("/health", get(api::health))
        .layer(axum::middleware::from_fn(
            crate::core::MetricsMiddleware::track_metrics,
        ))
        .route("/metrics", get(api::metrics_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(crate::core::request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
