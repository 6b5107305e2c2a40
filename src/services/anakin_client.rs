//! HTTP client for the Anakin chatbot API.
//!
//! [`AnakinClient::send`] performs a blocking-style call and returns the full
//! answer text. [`AnakinClient::send_stream`] returns a lazy event stream that
//! parses the upstream line protocol into [`UpstreamEvent`]s.

use crate::api::models::Message;
use crate::core::config::UpstreamConfig;
use crate::core::logging::get_request_id;
use crate::core::metrics::get_metrics;
use crate::core::{AppError, Result};
use crate::services::model_resolver::AppId;
use crate::transformer::anakin::{extract_content, AnakinRequest};
use crate::transformer::stream::{parse_data_line, DataLine, LineDecoder};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::{Duration, Instant};

pub const API_VERSION_HEADER: &str = "X-Anakin-Api-Version";

/// One unit of a streaming upstream response.
///
/// A stream yields zero or more `Content` events followed by exactly one
/// `Done` or `Error`, then ends.
#[derive(Debug)]
pub enum UpstreamEvent {
    /// Raw JSON text of one content fragment
    Content(String),
    Done,
    Error(AppError),
}

/// Lazy, single-consumer sequence of upstream events.
pub type UpstreamEventStream = Pin<Box<dyn Stream<Item = UpstreamEvent> + Send>>;

/// Build the shared HTTP client used for every upstream call.
///
/// `request_timeout` bounds a whole call including a streaming body.
pub fn build_http_client(config: &UpstreamConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.verify_ssl)
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

/// Client for `POST {base_url}/v1/chatbots/{app_id}/messages`.
#[derive(Clone)]
pub struct AnakinClient {
    http_client: reqwest::Client,
    base_url: String,
    api_version: String,
    idle_timeout: Duration,
}

impl AnakinClient {
    pub fn new(http_client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Override the maximum silence allowed between two streaming reads.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn messages_url(&self, app_id: AppId) -> String {
        format!("{}/v1/chatbots/{}/messages", self.base_url, app_id)
    }

    fn build_request(
        &self,
        api_key: &str,
        app_id: AppId,
        body: &AnakinRequest,
    ) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.messages_url(app_id))
            .header(API_VERSION_HEADER, &self.api_version)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
    }

    /// Send a conversation and wait for the complete answer.
    ///
    /// Non-2xx statuses fail with [`AppError::UpstreamHttp`] carrying the
    /// error body; connection and timeout failures with
    /// [`AppError::UpstreamTransport`].
    pub async fn send(&self, api_key: &str, app_id: AppId, messages: &[Message]) -> Result<String> {
        let request_id = get_request_id();
        let app_label = app_id.to_string();
        let metrics = get_metrics();
        let body = AnakinRequest::new(messages, false);

        let start = Instant::now();
        let response = self
            .build_request(api_key, app_id, &body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %request_id,
                    app_id,
                    error = %e,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "HTTP request failed to upstream"
                );
                metrics
                    .upstream_errors
                    .with_label_values(&[&app_label, "transport"])
                    .inc();
                AppError::from(e)
            })?;

        metrics
            .upstream_latency
            .with_label_values(&[&app_label, "false"])
            .observe(start.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(
                request_id = %request_id,
                app_id,
                status = status.as_u16(),
                body = %error_body,
                "Upstream returned error status"
            );
            metrics
                .upstream_errors
                .with_label_values(&[&app_label, "http"])
                .inc();
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let text = response.text().await?;
        tracing::debug!(request_id = %request_id, app_id, body = %text, "Upstream response");

        let value: serde_json::Value = serde_json::from_str(&text)?;
        Ok(extract_content(&value))
    }

    /// Send a conversation with `stream: true` and return its events.
    ///
    /// Nothing is sent until the stream is first polled. Dropping the stream
    /// drops the upstream response and releases its connection. A body that
    /// ends without the `[DONE]` sentinel still finishes with
    /// [`UpstreamEvent::Done`].
    pub fn send_stream(
        &self,
        api_key: &str,
        app_id: AppId,
        messages: &[Message],
    ) -> UpstreamEventStream {
        let request = self.build_request(api_key, app_id, &AnakinRequest::new(messages, true));
        let idle_timeout = self.idle_timeout;
        let request_id = get_request_id();

        Box::pin(async_stream::stream! {
            let metrics = get_metrics();
            let app_label = app_id.to_string();

            let start = Instant::now();
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        app_id,
                        error = %e,
                        is_timeout = e.is_timeout(),
                        is_connect = e.is_connect(),
                        "Streaming request failed to upstream"
                    );
                    metrics
                        .upstream_errors
                        .with_label_values(&[&app_label, "transport"])
                        .inc();
                    yield UpstreamEvent::Error(AppError::from(e));
                    return;
                }
            };

            metrics
                .upstream_latency
                .with_label_values(&[&app_label, "true"])
                .observe(start.elapsed().as_secs_f64());

            let status = response.status();
            if !status.is_success() {
                tracing::error!(
                    request_id = %request_id,
                    app_id,
                    status = status.as_u16(),
                    "Upstream returned error status for stream"
                );
                metrics
                    .upstream_errors
                    .with_label_values(&[&app_label, "http"])
                    .inc();
                yield UpstreamEvent::Error(AppError::UpstreamHttp {
                    status: status.as_u16(),
                    body: String::new(),
                });
                return;
            }

            let mut body = Box::pin(response.bytes_stream());
            let mut decoder = LineDecoder::new();

            loop {
                let next = match tokio::time::timeout(idle_timeout, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::error!(
                            request_id = %request_id,
                            app_id,
                            idle_timeout_secs = idle_timeout.as_secs_f64(),
                            "Upstream stream went idle"
                        );
                        metrics
                            .upstream_errors
                            .with_label_values(&[&app_label, "idle_timeout"])
                            .inc();
                        yield UpstreamEvent::Error(AppError::UpstreamIdleTimeout(
                            idle_timeout.as_secs(),
                        ));
                        return;
                    }
                };

                let lines = match next {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => {
                        tracing::error!(
                            request_id = %request_id,
                            app_id,
                            error = %e,
                            "Failed reading upstream stream"
                        );
                        metrics
                            .upstream_errors
                            .with_label_values(&[&app_label, "transport"])
                            .inc();
                        yield UpstreamEvent::Error(AppError::from(e));
                        return;
                    }
                    None => break,
                };

                for line in lines {
                    match parse_data_line(&line) {
                        Some(DataLine::Done) => {
                            tracing::info!(request_id = %request_id, app_id, "Upstream stream completed");
                            yield UpstreamEvent::Done;
                            return;
                        }
                        Some(DataLine::Payload(data)) => {
                            tracing::debug!(request_id = %request_id, data = %data, "Received upstream fragment");
                            yield UpstreamEvent::Content(data);
                        }
                        None => {}
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                if let Some(DataLine::Payload(data)) = parse_data_line(&line) {
                    yield UpstreamEvent::Content(data);
                }
            }

            tracing::info!(
                request_id = %request_id,
                app_id,
                "Upstream stream ended without [DONE], treating as complete"
            );
            yield UpstreamEvent::Done;
        })
    }
}
