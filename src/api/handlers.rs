//! HTTP request handlers.
//!
//! This module contains the chat completions endpoint plus model listing,
//! health and metrics.

use crate::api::models::*;
use crate::api::streaming::create_sse_response;
use crate::core::config::AppConfig;
use crate::core::logging::get_request_id;
use crate::core::middleware::ModelName;
use crate::core::{AppError, Result};
use crate::services::{AnakinClient, ModelResolver};
use crate::transformer::ResponseTranslator;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub resolver: ModelResolver,
    pub client: AnakinClient,
    /// One permit per open streaming response
    pub stream_slots: Arc<Semaphore>,
    /// Unix timestamp reported as `created` in the model list
    pub started_at: i64,
}

impl AppState {
    pub fn new(config: AppConfig, http_client: reqwest::Client) -> Self {
        let resolver = ModelResolver::from_config(&config);
        let client = AnakinClient::new(http_client, &config.upstream);
        let stream_slots = Arc::new(Semaphore::new(config.server.max_concurrent_streams));

        Self {
            config,
            resolver,
            client,
            stream_slots,
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Replace the upstream client, keeping everything else.
    pub fn with_client(mut self, client: AnakinClient) -> Self {
        self.client = client;
        self
    }
}

/// Extract the caller's API key from the `Authorization` header.
///
/// A leading `Bearer ` is stripped; the remainder is forwarded upstream as is.
fn extract_api_key(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    let key = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if key.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(key.to_string())
}

/// Handle chat completion requests.
///
/// Supports both streaming and non-streaming responses. Authorization,
/// message presence and model resolution are all checked before any
/// upstream call is made.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Response {
    let model = payload
        .as_ref()
        .map(|Json(p)| p.model.clone())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut response = match handle_chat_completion(state, headers, payload).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    response.extensions_mut().insert(ModelName(model));
    response
}

async fn handle_chat_completion(
    state: Arc<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request_id = get_request_id();
    let is_stream = payload.is_stream();

    tracing::info!(
        request_id = %request_id,
        model = %payload.model,
        stream = is_stream,
        messages = payload.messages.len(),
        "Received chat completion request"
    );

    let api_key = extract_api_key(&headers)?;

    if payload.messages.is_empty() {
        return Err(AppError::BadRequest("messages must not be empty".to_string()));
    }

    let app_id = state.resolver.resolve(&payload.model)?;
    let translator = ResponseTranslator::new(payload.model.clone());

    if is_stream {
        let permit = state
            .stream_slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::Overloaded)?;

        tracing::debug!(
            request_id = %request_id,
            model = %payload.model,
            app_id,
            "Opening upstream stream"
        );
        let events = state.client.send_stream(&api_key, app_id, &payload.messages);
        return Ok(create_sse_response(events, translator, Some(permit)));
    }

    let answer = state
        .client
        .send(&api_key, app_id, &payload.messages)
        .await?;

    Ok(Json(translator.to_response(Some(answer.as_str()))).into_response())
}

/// List configured models.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    let data = state
        .resolver
        .model_names()
        .into_iter()
        .map(|id| ModelInfo {
            id,
            object: "model".to_string(),
            created: state.started_at,
            owned_by: "anakin".to_string(),
        })
        .collect();

    Json(ModelList {
        object: "list".to_string(),
        data,
    })
}

/// Basic health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        models: state.resolver.len(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler() -> Result<Response> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response())
}
