// Trace pipeline: OTLP/HTTP span exporter behind a batch processor

use opentelemetry::global;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};

use super::exporter::ExporterConfig;
use super::resource::ServiceResource;
use super::TelemetryError;

/// Build the tracer provider and install it globally
///
/// The batch processor exports from its own thread. The W3C trace-context
/// propagator is installed alongside the provider.
///
/// # Errors
/// - TelemetryError::Exporter if the span exporter cannot be built
pub fn build_tracer_provider(
    exporter: &ExporterConfig,
    resource: &ServiceResource,
) -> Result<SdkTracerProvider, TelemetryError> {
    let span_exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(exporter.traces_url())
        .with_protocol(Protocol::HttpBinary)
        .with_headers(exporter.headers.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter {
            signal: "traces",
            reason: e.to_string(),
        })?;

    let provider = SdkTracerProvider::builder()
        .with_span_processor(BatchSpanProcessor::builder(span_exporter).build())
        .with_resource(resource.to_otel())
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    Ok(provider)
}
