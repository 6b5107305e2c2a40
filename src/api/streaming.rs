//! Server-Sent Events (SSE) streaming support for chat completions.
//!
//! Upstream events are mapped one to one onto outbound frames, in arrival
//! order:
//! - `Content` → one `chat.completion.chunk` frame, or nothing if the
//!   fragment is not valid JSON
//! - `Done` → `data: [DONE]` and end of body
//! - `Error` → body aborted with an error, no `[DONE]`

use crate::core::logging::get_request_id;
use crate::core::metrics::get_metrics;
use crate::core::AppError;
use crate::services::{UpstreamEvent, UpstreamEventStream};
use crate::transformer::ResponseTranslator;
use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio::sync::OwnedSemaphorePermit;

/// Translate upstream events into outbound SSE frames.
///
/// `permit` is held until the returned stream finishes or is dropped, so a
/// client disconnect releases both the upstream connection and the stream
/// slot.
pub fn sse_frames(
    mut events: UpstreamEventStream,
    translator: ResponseTranslator,
    permit: Option<OwnedSemaphorePermit>,
) -> impl Stream<Item = Result<Bytes, AppError>> + Send {
    let request_id = get_request_id();

    async_stream::stream! {
        let _permit = permit;
        let metrics = get_metrics();
        let model = translator.model().to_string();

        while let Some(event) = events.next().await {
            match event {
                UpstreamEvent::Content(data) => match translator.fragment_to_frame(&data) {
                    Ok(frame) => {
                        metrics
                            .stream_chunks
                            .with_label_values(&[&model, "emitted"])
                            .inc();
                        yield Ok(Bytes::from(frame));
                    }
                    Err(e) => {
                        tracing::warn!(
                            request_id = %request_id,
                            model = %model,
                            error = %e,
                            data = %data,
                            "Dropping malformed upstream fragment"
                        );
                        metrics
                            .stream_chunks
                            .with_label_values(&[&model, "dropped"])
                            .inc();
                    }
                },
                UpstreamEvent::Done => {
                    tracing::info!(request_id = %request_id, model = %model, "Streaming response completed");
                    yield Ok(Bytes::from(translator.done_frame()));
                    return;
                }
                UpstreamEvent::Error(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        model = %model,
                        error = %e,
                        "Streaming response aborted"
                    );
                    yield Err(e);
                    return;
                }
            }
        }
    }
}

/// Build a `text/event-stream` response from upstream events.
pub fn create_sse_response(
    events: UpstreamEventStream,
    translator: ResponseTranslator,
    permit: Option<OwnedSemaphorePermit>,
) -> Response {
    let body = Body::from_stream(sse_frames(events, translator, permit));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
