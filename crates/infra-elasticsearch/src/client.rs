// Elasticsearch client (SearchBackend implementation)
// reason: plain REST over reqwest; one host per request, no retry
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{field, info, warn, Instrument, Span};

use ecommerce_search_core::domain::{IndexName, SearchHit};
use ecommerce_search_core::port::{SearchBackend, SearchError};

use crate::error::{classify_response, classify_transport, ConnectError};
use crate::propagation::trace_context_headers;
use crate::settings::{AuthMode, ElasticsearchSettings};

const USER_AGENT: &str = concat!("ecommerce-search/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// Elasticsearch REST client
///
/// When `instrumented` is set every call runs in a client span and carries
/// the W3C `traceparent` header of that span.
pub struct ElasticsearchClient {
    http: reqwest::Client,
    hosts: Vec<Url>,
    next_host: AtomicUsize,
    auth: AuthMode,
    instrumented: bool,
}

impl ElasticsearchClient {
    /// Create a client without contacting the cluster
    pub fn new(settings: ElasticsearchSettings, instrumented: bool) -> Result<Self, ConnectError> {
        if settings.hosts.is_empty() {
            return Err(ConnectError::NoHosts);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectError::Client(e.to_string()))?;

        Ok(Self {
            http,
            hosts: settings.hosts,
            next_host: AtomicUsize::new(0),
            auth: settings.auth,
            instrumented,
        })
    }

    /// Create a client and verify the cluster answers a ping
    ///
    /// # Errors
    /// - ConnectError::Client if the HTTP client cannot be built
    /// - ConnectError::PingFailed if the liveness check fails
    pub async fn connect(
        settings: ElasticsearchSettings,
        instrumented: bool,
    ) -> Result<Self, ConnectError> {
        let hosts = settings.host_names();
        info!(
            hosts = ?hosts,
            auth = settings.auth.describe(),
            "Connecting to Elasticsearch"
        );

        let client = Self::new(settings, instrumented)?;
        if !client.ping().await {
            return Err(ConnectError::PingFailed { hosts });
        }

        info!(hosts = ?hosts, "Connected (ping) to Elasticsearch");
        Ok(client)
    }

    /// Liveness check (`HEAD /` on the first host)
    pub async fn ping(&self) -> bool {
        let host = self.hosts[0].clone();
        let span = self.client_span("ping", &Method::HEAD, &host, None);

        async {
            match self.request(Method::HEAD, host.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    record_status(status.as_u16());
                    if !status.is_success() {
                        record_error("http_status");
                        warn!(host = %host, status = status.as_u16(), "Elasticsearch ping rejected");
                    }
                    status.is_success()
                }
                Err(err) => {
                    record_error("connection");
                    warn!(host = %host, error = %err, "Elasticsearch ping failed");
                    false
                }
            }
        }
        .instrument(span)
        .await
    }

    fn next_host(&self) -> &Url {
        let i = self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        &self.hosts[i]
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        let builder = match &self.auth {
            AuthMode::ApiKey { id, secret } => builder.header(
                AUTHORIZATION,
                format!("ApiKey {}", STANDARD.encode(format!("{id}:{secret}"))),
            ),
            AuthMode::Basic { user, password } => builder.basic_auth(user, Some(password)),
            AuthMode::None => builder,
        };

        if self.instrumented {
            builder.headers(trace_context_headers())
        } else {
            builder
        }
    }

    fn client_span(
        &self,
        operation: &'static str,
        method: &Method,
        host: &Url,
        index: Option<&IndexName>,
    ) -> Span {
        if !self.instrumented {
            return Span::none();
        }

        tracing::info_span!(
            "elasticsearch",
            otel.name = operation,
            otel.kind = "client",
            db.system = "elasticsearch",
            db.operation = operation,
            db.elasticsearch.path_parts.index = index.map(IndexName::as_str),
            http.request.method = %method,
            server.address = host.host_str().unwrap_or_default(),
            server.port = host.port_or_known_default(),
            http.response.status_code = field::Empty,
            otel.status_code = field::Empty,
            error.type = field::Empty,
        )
    }

    async fn execute_search(
        &self,
        url: Url,
        index: &IndexName,
        body: &Value,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        record_status(status.as_u16());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_response(status.as_u16(), &text, index.as_str()));
        }

        let parsed: SearchResponse =
            response.json().await.map_err(|e| SearchError::Backend {
                status: Some(status.as_u16()),
                reason: format!("unreadable search response: {e}"),
            })?;

        Ok(parsed.hits.hits)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(&self, index: &IndexName, body: &Value) -> Result<Vec<SearchHit>, SearchError> {
        let host = self.next_host();
        let url = search_url(host, index)?;
        let span = self.client_span("search", &Method::POST, host, Some(index));

        async move {
            let result = self.execute_search(url, index, body).await;
            if let Err(err) = &result {
                record_error(error_type(err));
            }
            result
        }
        .instrument(span)
        .await
    }

    fn hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|h| h.as_str().trim_end_matches('/').to_string())
            .collect()
    }
}

/// `<host>/<index>/_search`, with the index kept as one path segment
///
/// Target syntax such as `cluster:index` or `a,b` must not be parsed as a
/// URL scheme or split into several segments.
fn search_url(host: &Url, index: &IndexName) -> Result<Url, SearchError> {
    let mut url = host.clone();
    url.path_segments_mut()
        .map_err(|()| SearchError::Backend {
            status: None,
            reason: format!("host '{host}' cannot carry a path"),
        })?
        .pop_if_empty()
        .push(index.as_str())
        .push("_search");
    Ok(url)
}

fn error_type(err: &SearchError) -> &'static str {
    match err {
        SearchError::Connection(_) => "connection",
        SearchError::IndexNotFound { .. } => "index_not_found",
        SearchError::Authentication(_) => "authentication",
        SearchError::Backend { .. } => "backend",
    }
}

fn record_status(status: u16) {
    Span::current().record("http.response.status_code", status);
}

fn record_error(kind: &'static str) {
    let span = Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("error.type", kind);
}
