//! Telemetry setup: OTLP traces, ECS logs and their shared resource
//!
//! Built once on the main thread before the async runtime starts. The
//! returned [`TelemetryGuard`] owns every provider and flushes them on
//! shutdown.

mod ecs;
mod exporter;
mod filter;
mod logs;
mod resource;
mod trace;

pub use exporter::ExporterConfig;

use ecs::EcsLayer;
use filter::parse_level;
use logs::LogSink;
use resource::ServiceResource;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer as _, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

const TRACER_NAME: &str = "ecommerce-search";

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("{signal} exporter unavailable: {reason}")]
    Unavailable {
        signal: &'static str,
        reason: String,
    },

    #[error("failed to build {signal} exporter: {reason}")]
    Exporter {
        signal: &'static str,
        reason: String,
    },

    #[error("no log sink could be installed")]
    NoLogSink,

    #[error("failed to install the tracing subscriber: {0}")]
    Subscriber(String),
}

/// Inputs for [`init`]
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub exporter: ExporterConfig,
    pub resource_attributes: String,
}

/// Diagnostic raised before the subscriber exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupNotice {
    pub level: Level,
    pub message: String,
}

impl StartupNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::INFO,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: Level::WARN,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::ERROR,
            message: message.into(),
        }
    }
}

/// Emit buffered notices through the installed subscriber
pub fn replay(notices: Vec<StartupNotice>) {
    for notice in notices {
        match notice.level {
            Level::ERROR => error!(startup = true, "{}", notice.message),
            Level::WARN => warn!(startup = true, "{}", notice.message),
            _ => info!(startup = true, "{}", notice.message),
        }
    }
}

/// Build the trace and log pipelines and install the global subscriber
///
/// A failing trace exporter leaves tracing inert; a failing OTLP log sink
/// falls back to stdout. Both are reported once the subscriber is up.
///
/// # Errors
/// - TelemetryError::NoLogSink if no sink could be built
/// - TelemetryError::Subscriber if a global subscriber is already set
pub fn init(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let mut notices = Vec::new();

    let (resource, rejected) =
        ServiceResource::build(&config.service_name, &config.resource_attributes);
    for segment in rejected {
        notices.push(StartupNotice::warn(format!(
            "Ignoring malformed OTEL_RESOURCE_ATTRIBUTES segment '{segment}'"
        )));
    }
    if !config.exporter.rejected_headers.is_empty() {
        // Header segments may hold credentials, so only the count is reported
        notices.push(StartupNotice::warn(format!(
            "Ignoring {} malformed OTEL_EXPORTER_OTLP_HEADERS segment(s)",
            config.exporter.rejected_headers.len()
        )));
    }

    let tracer_provider = match trace::build_tracer_provider(&config.exporter, &resource) {
        Ok(provider) => {
            notices.push(StartupNotice::info(format!(
                "Tracing configured: exporter=otlp endpoint={} headers={}",
                config.exporter.traces_url(),
                !config.exporter.headers.is_empty()
            )));
            Some(provider)
        }
        Err(e) => {
            notices.push(StartupNotice::error(format!(
                "Trace exporter could not be configured, tracing is inactive: {e}"
            )));
            None
        }
    };

    let chain = logs::default_chain(&config.exporter, &resource);
    let sink = logs::select_log_sink(&chain, &mut notices)?;
    let level = parse_level(&config.log_level);

    compose(
        level,
        tracer_provider.as_ref(),
        EcsLayer::new(resource.service_name(), sink.clone()),
    )
    .try_init()
    .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    replay(notices);

    Ok(TelemetryGuard {
        tracer_provider,
        sink,
        level,
        service_name: resource.service_name().to_string(),
        released: false,
    })
}

/// Subscriber with one filter per layer
///
/// APP_LOG_LEVEL only gates what the ECS layer writes; the OpenTelemetry
/// layer keeps its own span floor so a quiet log level never disables tracing.
fn compose(
    level: LevelFilter,
    tracer_provider: Option<&SdkTracerProvider>,
    ecs: EcsLayer,
) -> impl Subscriber + Send + Sync + 'static {
    let otel_layer = tracer_provider.map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer(TRACER_NAME))
            .with_filter(filter::span_filter())
    });

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(ecs.with_filter(filter::log_filter(level)))
}

/// Owner of the telemetry providers
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    sink: Arc<dyn LogSink>,
    level: LevelFilter,
    service_name: String,
    released: bool,
}

impl TelemetryGuard {
    pub fn tracing_active(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Name of the active log sink
    pub fn log_sink(&self) -> &'static str {
        self.sink.name()
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Flush and shut down every provider
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.force_flush() {
                warn!(error = %e, "Failed to flush tracer provider");
            }
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
        self.sink.shutdown();
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.release();
    }
}
