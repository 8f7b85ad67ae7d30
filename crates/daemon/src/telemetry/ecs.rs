//! ECS log formatting layer
//!
//! Turns every `tracing` event into one Elastic Common Schema document and
//! hands it to the active [`LogSink`]. Events inside a span carrying
//! OpenTelemetry data get `trace.id` and `span.id`.

use chrono::{DateTime, SecondsFormat, Utc};
use opentelemetry::trace::{SpanId, TraceContextExt, TraceId};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_opentelemetry::OtelData;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

use super::logs::{LogEntry, LogSink};

pub const ECS_VERSION: &str = "1.6.0";

pub struct EcsLayer {
    service_name: String,
    sink: Arc<dyn LogSink>,
}

impl EcsLayer {
    pub fn new(service_name: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            service_name: service_name.into(),
            sink,
        }
    }
}

impl<S> Layer<S> for EcsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut fields = FieldVisitor::default();
        event.record(&mut fields);

        let trace = ctx
            .event_scope(event)
            .and_then(|scope| scope.into_iter().find_map(|span| otel_ids(&span)));
        let timestamp = SystemTime::now();

        let mut doc = fields.extra;
        doc.insert("@timestamp".into(), Value::String(format_timestamp(timestamp)));
        doc.insert("log.level".into(), Value::from(ecs_level(metadata.level())));
        doc.insert("log.logger".into(), Value::from(metadata.target()));
        doc.insert("message".into(), Value::String(fields.message));
        doc.insert("ecs.version".into(), Value::from(ECS_VERSION));
        doc.insert("service.name".into(), Value::from(self.service_name.as_str()));
        if let Some(file) = metadata.file() {
            doc.insert("log.origin.file.name".into(), Value::from(file));
        }
        if let Some(line) = metadata.line() {
            doc.insert("log.origin.file.line".into(), Value::from(line));
        }
        if let Some((trace_id, span_id)) = trace {
            doc.insert("trace.id".into(), Value::String(trace_id.to_string()));
            doc.insert("span.id".into(), Value::String(span_id.to_string()));
        }

        let document = Value::Object(doc);
        self.sink.write(&LogEntry {
            level: *metadata.level(),
            target: metadata.target(),
            timestamp,
            trace,
            document: &document,
        });
    }
}

/// Trace and span ids the span will be exported with
///
/// A valid parent context decides the trace id, including a remote parent
/// attached after the span was created; `builder.trace_id` is only used for
/// root spans.
fn otel_ids<S>(span: &SpanRef<'_, S>) -> Option<(TraceId, SpanId)>
where
    S: for<'a> LookupSpan<'a>,
{
    let extensions = span.extensions();
    let data = extensions.get::<OtelData>()?;
    let span_id = data.builder.span_id?;
    let parent = data.parent_cx.span();
    let parent_context = parent.span_context();
    let trace_id = if parent_context.is_valid() {
        parent_context.trace_id()
    } else {
        data.builder.trace_id?
    };
    Some((trace_id, span_id))
}

fn ecs_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warning",
        Level::ERROR => "error",
    }
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    extra: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.extra.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}
