//! Ecommerce Search - Main Entry Point
//! Search form over Elasticsearch with OTLP traces and ECS logs

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use ecommerce_search_api_http::{
    attach_instrumentation, AppState, HttpServer, InstrumentationState,
};
use ecommerce_search_core::application::SearchService;
use ecommerce_search_core::port::SearchBackend;
use ecommerce_search_core::VERSION;
use ecommerce_search_infra_elasticsearch::ElasticsearchClient;

use config::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::parse();

    // 1. The collector endpoint is mandatory; nothing else starts without it
    let telemetry_config = match config.telemetry() {
        Ok(telemetry_config) => telemetry_config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    // 2. Telemetry before the runtime (exporters own blocking HTTP clients)
    let guard = telemetry::init(&telemetry_config).context("Telemetry initialization failed")?;

    info!(
        version = VERSION,
        service_name = guard.service_name(),
        log_level = %guard.level(),
        "Ecommerce Search starting"
    );
    if guard.log_sink() == "otlp" {
        info!(log_sink = guard.log_sink(), "Logs are exported via OTLP in ECS format");
    } else {
        warn!(
            log_sink = guard.log_sink(),
            "OTLP log exporter inactive, ECS logs are written to stdout"
        );
    }

    let instrumentation = attach_instrumentation(guard.tracing_active()).unwrap_or_else(|e| {
        warn!(error = %e, "Instrumentation not attached");
        InstrumentationState::detached()
    });

    if config.secret_key_is_insecure() {
        warn!("APP_SECRET_KEY is not set to a secure value");
    }

    // 3. Serve until Ctrl+C
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build the async runtime")?;
    let served = runtime.block_on(serve(&config, instrumentation));

    // 4. Flush telemetry after the server has drained
    drop(runtime);
    if let Err(e) = &served {
        error!(error = %e, "Ecommerce Search stopped with error");
    }
    info!("Shutdown complete.");
    guard.shutdown();

    served
}

async fn serve(config: &AppConfig, instrumentation: InstrumentationState) -> Result<()> {
    let search = connect_backend(config, instrumentation.search_client).await;

    let state = AppState {
        search,
        instrumentation,
    };
    let handle = HttpServer::new(config.http(), state)
        .start()
        .await
        .context("HTTP server start failed")?;

    info!(address = %handle.local_addr(), "System ready. Press Ctrl+C to shut down");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for the shutdown signal")?;

    info!("Shutdown signal received. Exiting gracefully...");
    handle.stop().await;

    Ok(())
}

/// Connect to Elasticsearch; any failure leaves the backend absent
async fn connect_backend(config: &AppConfig, instrumented: bool) -> Option<Arc<SearchService>> {
    let settings = match config.elasticsearch() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "ELASTICSEARCH_HOSTS is missing or invalid; searches are disabled");
            return None;
        }
    };

    let index = match config.index() {
        Ok(index) => index,
        Err(e) => {
            error!(error = %e, index = %config.index_name, "INDEX_NAME is invalid; searches are disabled");
            return None;
        }
    };

    match ElasticsearchClient::connect(settings, instrumented).await {
        Ok(client) => {
            let backend: Arc<dyn SearchBackend> = Arc::new(client);
            info!(index = %index, "Search backend ready");
            Some(Arc::new(SearchService::new(backend, index)))
        }
        Err(e) => {
            error!(error = %e, "Elasticsearch connection failed; searches are disabled");
            None
        }
    }
}
