//! HTTP Server
//!
//! Binds the listener, mounts the routes and serves until stopped.

use crate::handler;
use crate::instrumentation::{InstrumentationState, ServerResponse, ServerSpan};
use axum::routing::get;
use axum::Router;
use ecommerce_search_core::application::SearchService;
use ecommerce_search_core::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 5000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Shared, read-only application context
#[derive(Clone)]
pub struct AppState {
    /// `None` when the backend was not configured or failed its ping
    pub search: Option<Arc<SearchService>>,
    pub instrumentation: InstrumentationState,
}

/// Build the application router
///
/// The server span layer is mounted only when HTTP instrumentation is attached.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(handler::index))
        .route("/search", get(handler::search));

    let routes = if state.instrumentation.http_server {
        routes.layer(
            TraceLayer::new_for_http()
                .make_span_with(ServerSpan)
                .on_response(ServerResponse),
        )
    } else {
        routes
    };

    routes.with_state(state)
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and start serving in the background
    ///
    /// # Errors
    /// - AppError::Config if host/port do not form a socket address
    /// - AppError::Io if the address cannot be bound
    pub async fn start(self) -> Result<ServerHandle, AppError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| {
                AppError::Config(format!(
                    "invalid listen address {}:{}: {}",
                    self.config.host, self.config.port, e
                ))
            })?;

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        info!(
            address = %local_addr,
            backend_available = self.state.search.is_some(),
            instrumented = self.state.instrumentation.http_server,
            "Starting HTTP server"
        );

        let app = router(self.state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "HTTP server terminated with error");
            }
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Handle to a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "HTTP server task failed");
        }
        info!("HTTP server stopped");
    }
}
