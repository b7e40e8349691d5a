use std::future::Future;

use axum::http::Request;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, TraceLayer};
use uuid::Uuid;

/// Correlation id attached to every HTTP request.
///
/// Generated when the caller does not supply an `x-request-id` header.
#[derive(Clone, Debug)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

tokio::task_local! {
    static ACTIVE_REQUEST_ID: RequestId;
}

/// Runs `future` with `request_id` installed as the task-local active id.
pub async fn scope_request_id<F: Future>(request_id: RequestId, future: F) -> F::Output {
    ACTIVE_REQUEST_ID.scope(request_id, future).await
}

/// The request id for the current task, if one is in scope.
pub fn current_request_id() -> Option<RequestId> {
    ACTIVE_REQUEST_ID.try_with(RequestId::clone).ok()
}

/// Builds the per-request span for the HTTP trace layer.
///
/// The request id middleware runs ahead of the trace layer, so the id is
/// normally read from request extensions. The header fallback covers routers
/// that mount the layer without that middleware.
#[derive(Clone, Copy, Default)]
pub struct HttpSpanMaker;

impl<B> MakeSpan<B> for HttpSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = match request.extensions().get::<RequestId>() {
            Some(id) => id.clone(),
            None => request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .map_or_else(RequestId::generate, RequestId::new),
        };

        tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// HTTP trace layer: one `http_request` span per request, 5xx classified as failures.
pub fn configure_http_tracing() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, HttpSpanMaker>
{
    TraceLayer::new_for_http().make_span_with(HttpSpanMaker)
}
