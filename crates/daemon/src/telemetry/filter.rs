// Per-layer filters: APP_LOG_LEVEL gates log events only, spans have their own floor

use tracing::Metadata;
use tracing_subscriber::filter::{filter_fn, FilterFn, LevelFilter, Targets};
use tracing_subscriber::EnvFilter;

// Transport crates stay silent so exporter traffic never re-enters the pipelines
const QUIET_TARGETS: [&str; 7] = [
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "opentelemetry",
    "opentelemetry_sdk",
    "opentelemetry_otlp",
];

/// Lowest span level handed to the OpenTelemetry layer
pub const SPAN_LEVEL: LevelFilter = LevelFilter::INFO;

/// Parse a level name, case-insensitively; unknown names fall back to INFO
pub fn parse_level(raw: &str) -> LevelFilter {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => LevelFilter::TRACE,
        "DEBUG" => LevelFilter::DEBUG,
        "INFO" => LevelFilter::INFO,
        "WARNING" | "WARN" => LevelFilter::WARN,
        "ERROR" | "CRITICAL" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn quiet(targets: Targets) -> Targets {
    targets.with_targets(QUIET_TARGETS.map(|target| (target, LevelFilter::OFF)))
}

/// Filter for the ECS layer
///
/// Events are cut at `level`. Spans pass at any level so an event keeps its
/// enclosing span, and with it the trace context, whatever APP_LOG_LEVEL is.
pub fn log_filter(level: LevelFilter) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    let events = quiet(Targets::new().with_default(level));
    let spans = quiet(Targets::new().with_default(LevelFilter::TRACE));
    filter_fn(move |meta| {
        let targets = if meta.is_span() { &spans } else { &events };
        targets.would_enable(meta.target(), meta.level())
    })
}

/// Filter for the OpenTelemetry layer, independent of APP_LOG_LEVEL
pub fn span_filter() -> EnvFilter {
    let directives = QUIET_TARGETS
        .map(|target| format!("{target}=off"))
        .join(",");
    EnvFilter::builder()
        .with_default_directive(SPAN_LEVEL.into())
        .parse_lossy(directives)
}
