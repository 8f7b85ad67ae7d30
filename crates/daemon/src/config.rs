//! Process configuration
//!
//! Every setting is read from the environment and may be overridden by a flag.

use clap::Parser;
use ecommerce_search_api_http::HttpServerConfig;
use ecommerce_search_core::domain::{DomainError, IndexName, DEFAULT_INDEX_NAME};
use ecommerce_search_core::AppError;
use ecommerce_search_infra_elasticsearch::{ConnectError, ElasticsearchSettings};

use crate::telemetry::{ExporterConfig, TelemetryConfig};

pub const DEFAULT_SECRET_KEY: &str = "default_secret_key_for_dev_only";
/// Value shipped in the sample environment file, never meant to be kept
pub const PLACEHOLDER_SECRET_KEY: &str = "ganti_dengan_kunci_rahasia_anda_yang_unik_dan_aman";

#[derive(Parser, Debug, Clone)]
#[command(name = "ecommerce-search")]
#[command(about = "Ecommerce search front end with OTLP telemetry", long_about = None)]
#[command(version)]
pub struct AppConfig {
    /// Service name reported in telemetry
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "ecommerce-search-app")]
    pub service_name: String,

    /// Minimum log severity (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long, env = "APP_LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    /// OTLP/HTTP collector base URL (required)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Exporter headers as key=value pairs separated by commas
    #[arg(long, env = "OTEL_EXPORTER_OTLP_HEADERS")]
    pub otlp_headers: Option<String>,

    /// Extra resource attributes as key=value pairs separated by commas
    #[arg(long, env = "OTEL_RESOURCE_ATTRIBUTES", default_value = "")]
    pub resource_attributes: String,

    #[arg(long, env = "APP_SECRET_KEY", default_value = DEFAULT_SECRET_KEY, hide_env_values = true)]
    pub secret_key: String,

    /// Comma-separated Elasticsearch hosts
    #[arg(long, env = "ELASTICSEARCH_HOSTS")]
    pub elasticsearch_hosts: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_USER")]
    pub elasticsearch_user: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_PASSWORD", hide_env_values = true)]
    pub elasticsearch_password: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_API_KEY_ID")]
    pub elasticsearch_api_key_id: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_API_KEY_SECRET", hide_env_values = true)]
    pub elasticsearch_api_key_secret: Option<String>,

    /// Index queried by every search
    #[arg(long, env = "INDEX_NAME", default_value = DEFAULT_INDEX_NAME)]
    pub index_name: String,

    /// Listen address
    #[arg(long, env = "APP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "APP_PORT", default_value_t = 5000)]
    pub port: u16,
}

impl AppConfig {
    /// Telemetry settings; the collector endpoint is mandatory
    ///
    /// # Errors
    /// - AppError::Config when the endpoint is unset or blank
    pub fn telemetry(&self) -> Result<TelemetryConfig, AppError> {
        let endpoint = self
            .otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "OTEL_EXPORTER_OTLP_ENDPOINT is not set; telemetry cannot be exported"
                        .to_string(),
                )
            })?;

        Ok(TelemetryConfig {
            service_name: self.service_name.clone(),
            log_level: self.log_level.clone(),
            exporter: ExporterConfig::new(endpoint, self.otlp_headers.as_deref()),
            resource_attributes: self.resource_attributes.clone(),
        })
    }

    pub fn secret_key_is_insecure(&self) -> bool {
        let key = self.secret_key.trim();
        key.is_empty() || key == DEFAULT_SECRET_KEY || key == PLACEHOLDER_SECRET_KEY
    }

    /// Backend settings, or NoHosts when ELASTICSEARCH_HOSTS is absent
    pub fn elasticsearch(&self) -> Result<ElasticsearchSettings, ConnectError> {
        ElasticsearchSettings::from_parts(
            self.elasticsearch_hosts.as_deref(),
            self.elasticsearch_api_key_id.as_deref(),
            self.elasticsearch_api_key_secret.as_deref(),
            self.elasticsearch_user.as_deref(),
            self.elasticsearch_password.as_deref(),
        )
    }

    pub fn index(&self) -> Result<IndexName, DomainError> {
        IndexName::parse(&self.index_name)
    }

    pub fn http(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}
