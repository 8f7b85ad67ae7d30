// OTLP/HTTP exporter settings shared by traces and logs

use std::collections::HashMap;

const TRACES_PATH: &str = "v1/traces";
const LOGS_PATH: &str = "v1/logs";

/// Collector endpoint and headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    /// Header segments that could not be parsed
    pub rejected_headers: Vec<String>,
}

impl ExporterConfig {
    pub fn new(endpoint: &str, raw_headers: Option<&str>) -> Self {
        let (headers, rejected_headers) = parse_headers(raw_headers.unwrap_or_default());
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            headers,
            rejected_headers,
        }
    }

    pub fn traces_url(&self) -> String {
        format!("{}/{TRACES_PATH}", self.endpoint)
    }

    pub fn logs_url(&self) -> String {
        format!("{}/{LOGS_PATH}", self.endpoint)
    }
}

/// Parse `key=value` pairs separated by commas
///
/// Each pair splits on the first `=`; key and value are trimmed. Segments
/// without `=` or with an empty key are returned as rejected.
pub fn parse_headers(raw: &str) -> (HashMap<String, String>, Vec<String>) {
    let mut headers = HashMap::new();
    let mut rejected = Vec::new();

    for segment in raw.split(',') {
        if segment.trim().is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => rejected.push(segment.trim().to_string()),
        }
    }

    (headers, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        let (headers, rejected) = parse_headers("Authorization=ApiKey abc==");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Authorization"], "ApiKey abc==");
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_multiple_pairs_are_kept() {
        let (headers, _) = parse_headers(" x-tenant = shop , Authorization=Bearer t0k");

        assert_eq!(headers["x-tenant"], "shop");
        assert_eq!(headers["Authorization"], "Bearer t0k");
    }

    #[test]
    fn test_malformed_pair_is_reported() {
        let (headers, rejected) = parse_headers("justatoken,a=b");

        assert_eq!(headers.len(), 1);
        assert_eq!(rejected, vec!["justatoken".to_string()]);
    }

    #[test]
    fn test_signal_urls() {
        let config = ExporterConfig::new("https://otlp.example.com:4318/", None);

        assert_eq!(config.traces_url(), "https://otlp.example.com:4318/v1/traces");
        assert_eq!(config.logs_url(), "https://otlp.example.com:4318/v1/logs");
        assert!(config.headers.is_empty());
    }
}
