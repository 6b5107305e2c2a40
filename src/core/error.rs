//! Error types and handling for the proxy.
//!
//! This module provides a unified error type [`AppError`] that covers request
//! validation, model resolution and upstream failures, and implements the
//! OpenAI-style error body returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const ERROR_TYPE_INVALID_REQUEST: &str = "invalid_request_error";
pub const ERROR_TYPE_AUTHENTICATION: &str = "authentication_error";
pub const ERROR_TYPE_UPSTREAM: &str = "upstream_error";
pub const ERROR_TYPE_API: &str = "api_error";
pub const ERROR_CODE_MODEL_NOT_SUPPORTED: &str = "model_not_supported";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// The requested model has no configured upstream app id
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// Client provided invalid data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or empty Authorization header
    #[error("Unauthorized")]
    Unauthorized,

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Connection, timeout or body read failure while talking to upstream
    #[error("Upstream transport error: {0}")]
    UpstreamTransport(#[from] reqwest::Error),

    /// Streaming body went silent for longer than the idle timeout
    #[error("Upstream stream idle for more than {0} seconds")]
    UpstreamIdleTimeout(u64),

    /// Upstream body was not the JSON we expect
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Streaming concurrency cap reached
    #[error("Too many concurrent streams")]
    Overloaded,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedModel(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UpstreamHttp { .. } | AppError::Serialization(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTransport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamIdleTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
            AppError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::UnsupportedModel(_) | AppError::BadRequest(_) => ERROR_TYPE_INVALID_REQUEST,
            AppError::Unauthorized => ERROR_TYPE_AUTHENTICATION,
            AppError::UpstreamHttp { .. }
            | AppError::UpstreamTransport(_)
            | AppError::UpstreamIdleTimeout(_)
            | AppError::Serialization(_) => ERROR_TYPE_UPSTREAM,
            AppError::Overloaded | AppError::Config(_) | AppError::Internal(_) => ERROR_TYPE_API,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let code = match &self {
            AppError::UnsupportedModel(_) => json!(ERROR_CODE_MODEL_NOT_SUPPORTED),
            _ => json!(status.as_u16()),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "code": code
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
