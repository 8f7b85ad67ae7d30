//! Request Instrumentation
//!
//! Server spans for inbound requests, remote parent extraction from the W3C
//! `traceparent` header, and the span annotator handed to the page layer.

use axum::extract::MatchedPath;
use axum::http::{HeaderMap, Request, Response};
use ecommerce_search_core::port::span::{ATTR_ERROR, ATTR_QUERY, ATTR_RESULTS_COUNT};
use ecommerce_search_core::port::{AttributeValue, NoopSpan, SpanAnnotator};
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use std::time::Duration;
use thiserror::Error;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{debug, field, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Which instrumentation layers are attached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstrumentationState {
    pub http_server: bool,
    pub search_client: bool,
}

impl InstrumentationState {
    /// Both layers detached
    pub fn detached() -> Self {
        Self::default()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentationError {
    #[error("trace pipeline is not active; HTTP server and search client stay uninstrumented")]
    TracingInactive,
}

/// Attach server and client instrumentation
///
/// # Errors
/// - InstrumentationError::TracingInactive when no tracer provider was installed
pub fn attach_instrumentation(
    tracing_active: bool,
) -> Result<InstrumentationState, InstrumentationError> {
    if !tracing_active {
        return Err(InstrumentationError::TracingInactive);
    }

    Ok(InstrumentationState {
        http_server: true,
        search_client: true,
    })
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Creates one server span per request
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerSpan;

impl<B> MakeSpan<B> for ServerSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or_else(|| request.uri().path());
        let method = request.method().as_str();
        let name = format!("{method} {route}");

        let span = tracing::info_span!(
            "request",
            otel.name = name.as_str(),
            otel.kind = "server",
            http.request.method = method,
            url.path = request.uri().path(),
            http.route = route,
            http.response.status_code = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
            app.search.query = field::Empty,
            app.search.results_count = field::Empty,
            app.search.error = field::Empty,
        );

        let parent = global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderExtractor(request.headers()))
        });
        span.set_parent(parent);

        span
    }
}

/// Records the response status on the server span
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerResponse;

impl<B> OnResponse<B> for ServerResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("http.response.status_code", status.as_u16());
        if status.is_server_error() {
            span.record("otel.status_code", "ERROR");
        }
        debug!(
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request finished"
        );
    }
}

/// SpanAnnotator over a `tracing` span
pub struct TracingSpan {
    span: Span,
}

impl TracingSpan {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl SpanAnnotator for TracingSpan {
    fn is_recording(&self) -> bool {
        !self.span.is_disabled()
    }

    fn set_attribute(&self, key: &'static str, value: AttributeValue) {
        if matches!(key, ATTR_QUERY | ATTR_RESULTS_COUNT | ATTR_ERROR) {
            match value {
                AttributeValue::Str(s) => self.span.record(key, s.as_str()),
                AttributeValue::Int(n) => self.span.record(key, n),
            };
            return;
        }
        // `record` drops fields the span was not created with
        let value = match value {
            AttributeValue::Str(s) => opentelemetry::Value::from(s),
            AttributeValue::Int(n) => opentelemetry::Value::I64(n),
        };
        self.span.set_attribute(key, value);
    }

    fn set_error(&self, description: &str) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("otel.status_message", description);
    }
}

/// Annotator for the request currently being served
pub fn request_span(state: &InstrumentationState) -> Box<dyn SpanAnnotator> {
    if state.http_server {
        Box::new(TracingSpan::new(Span::current()))
    } else {
        Box::new(NoopSpan)
    }
}
