//! Log pipeline
//!
//! Formatted log documents go to exactly one [`LogSink`]. The sink is chosen
//! once at startup by walking an ordered list of factories; the first one
//! that builds wins.

use serde_json::Value;
use std::io::Write as _;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use opentelemetry::trace::{SpanId, TraceId};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

use super::exporter::ExporterConfig;
use super::resource::ServiceResource;
use super::{StartupNotice, TelemetryError};

/// One formatted event
pub struct LogEntry<'a> {
    pub level: Level,
    pub target: &'static str,
    pub timestamp: SystemTime,
    pub trace: Option<(TraceId, SpanId)>,
    pub document: &'a Value,
}

/// Destination of formatted log documents
pub trait LogSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn write(&self, entry: &LogEntry<'_>);

    /// Flush buffered records and release the transport
    fn shutdown(&self);
}

/// Builds a sink, or explains why it cannot
pub trait LogSinkFactory {
    fn name(&self) -> &'static str;

    /// # Errors
    /// - TelemetryError::Unavailable when this build lacks the transport
    /// - TelemetryError::Exporter when construction fails
    fn build(&self) -> Result<Arc<dyn LogSink>, TelemetryError>;
}

/// Try each factory in order and keep the first sink that builds
///
/// Skipped factories leave a notice: a warning when unavailable, an error
/// when construction failed.
///
/// # Errors
/// - TelemetryError::NoLogSink if every factory failed
pub fn select_log_sink(
    chain: &[Box<dyn LogSinkFactory>],
    notices: &mut Vec<StartupNotice>,
) -> Result<Arc<dyn LogSink>, TelemetryError> {
    for factory in chain {
        match factory.build() {
            Ok(sink) => return Ok(sink),
            Err(err @ TelemetryError::Unavailable { .. }) => {
                notices.push(StartupNotice::warn(format!(
                    "Log sink '{}' skipped: {err}",
                    factory.name()
                )));
            }
            Err(err) => {
                notices.push(StartupNotice::error(format!(
                    "Log sink '{}' failed: {err}",
                    factory.name()
                )));
            }
        }
    }
    Err(TelemetryError::NoLogSink)
}

/// Default chain: OTLP first, stdout as the fallback
pub fn default_chain(
    exporter: &ExporterConfig,
    resource: &ServiceResource,
) -> Vec<Box<dyn LogSinkFactory>> {
    vec![
        Box::new(OtlpLogSinkFactory::new(exporter.clone(), resource.clone())),
        Box::new(StdoutSinkFactory),
    ]
}

// ============================================================================
// stdout
// ============================================================================

/// JSON lines on stdout through a non-blocking writer thread
pub struct StdoutSink {
    writer: NonBlocking,
    worker: Mutex<Option<WorkerGuard>>,
}

impl StdoutSink {
    pub fn new() -> Self {
        let (writer, worker) = tracing_appender::non_blocking(std::io::stdout());
        Self {
            writer,
            worker: Mutex::new(Some(worker)),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn write(&self, entry: &LogEntry<'_>) {
        let mut line = entry.document.to_string();
        line.push('\n');
        let _ = self.writer.clone().write_all(line.as_bytes());
    }

    fn shutdown(&self) {
        // Dropping the worker guard drains the queue
        if let Ok(mut worker) = self.worker.lock() {
            worker.take();
        }
    }
}

pub struct StdoutSinkFactory;

impl LogSinkFactory for StdoutSinkFactory {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn build(&self) -> Result<Arc<dyn LogSink>, TelemetryError> {
        Ok(Arc::new(StdoutSink::new()))
    }
}

// ============================================================================
// OTLP
// ============================================================================

#[cfg_attr(not(feature = "otlp-logs"), allow(dead_code))]
pub struct OtlpLogSinkFactory {
    exporter: ExporterConfig,
    resource: ServiceResource,
}

impl OtlpLogSinkFactory {
    pub fn new(exporter: ExporterConfig, resource: ServiceResource) -> Self {
        Self { exporter, resource }
    }
}

impl LogSinkFactory for OtlpLogSinkFactory {
    fn name(&self) -> &'static str {
        "otlp"
    }

    #[cfg(feature = "otlp-logs")]
    fn build(&self) -> Result<Arc<dyn LogSink>, TelemetryError> {
        otlp::build(&self.exporter, &self.resource)
    }

    #[cfg(not(feature = "otlp-logs"))]
    fn build(&self) -> Result<Arc<dyn LogSink>, TelemetryError> {
        Err(TelemetryError::Unavailable {
            signal: "logs",
            reason: "built without the otlp-logs feature".to_string(),
        })
    }
}

#[cfg(feature = "otlp-logs")]
mod otlp {
    use super::*;
    use opentelemetry::logs::{AnyValue, LogRecord as _, Logger, LoggerProvider as _, Severity};
    use opentelemetry_otlp::{LogExporter, Protocol, WithExportConfig, WithHttpConfig};
    use opentelemetry_sdk::logs::{BatchLogProcessor, SdkLoggerProvider};

    const LOGGER_NAME: &str = "ecommerce-search";

    /// Emits each document as the body of an OTLP log record
    pub struct OtlpLogSink<L> {
        provider: SdkLoggerProvider,
        logger: L,
    }

    pub(super) fn build(
        exporter: &ExporterConfig,
        resource: &ServiceResource,
    ) -> Result<Arc<dyn LogSink>, TelemetryError> {
        let log_exporter = LogExporter::builder()
            .with_http()
            .with_endpoint(exporter.logs_url())
            .with_protocol(Protocol::HttpBinary)
            .with_headers(exporter.headers.clone())
            .build()
            .map_err(|e| TelemetryError::Exporter {
                signal: "logs",
                reason: e.to_string(),
            })?;

        let provider = SdkLoggerProvider::builder()
            .with_log_processor(BatchLogProcessor::builder(log_exporter).build())
            .with_resource(resource.to_otel())
            .build();
        let logger = provider.logger(LOGGER_NAME);

        Ok(Arc::new(OtlpLogSink { provider, logger }))
    }

    fn severity(level: Level) -> (Severity, &'static str) {
        match level {
            Level::TRACE => (Severity::Trace, "TRACE"),
            Level::DEBUG => (Severity::Debug, "DEBUG"),
            Level::INFO => (Severity::Info, "INFO"),
            Level::WARN => (Severity::Warn, "WARN"),
            Level::ERROR => (Severity::Error, "ERROR"),
        }
    }

    impl<L> LogSink for OtlpLogSink<L>
    where
        L: Logger + Send + Sync,
    {
        fn name(&self) -> &'static str {
            "otlp"
        }

        fn write(&self, entry: &LogEntry<'_>) {
            let (number, text) = severity(entry.level);
            let mut record = self.logger.create_log_record();
            record.set_timestamp(entry.timestamp);
            record.set_observed_timestamp(SystemTime::now());
            record.set_severity_number(number);
            record.set_severity_text(text);
            record.set_target(entry.target);
            record.set_body(AnyValue::String(entry.document.to_string().into()));
            if let Some((trace_id, span_id)) = entry.trace {
                record.set_trace_context(trace_id, span_id, None);
            }
            self.logger.emit(record);
        }

        fn shutdown(&self) {
            if let Err(e) = self.provider.shutdown() {
                eprintln!("Error shutting down logger provider: {e}");
            }
        }
    }
}
