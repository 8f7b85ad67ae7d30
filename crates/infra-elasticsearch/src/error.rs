//! Elasticsearch Error Types
//!
//! Maps transport failures and error responses to the typed `SearchError`.

use ecommerce_search_core::port::SearchError;
use serde_json::Value;
use thiserror::Error;

/// Marker the backend puts in security-related error types
const SECURITY_MARKER: &str = "security_exception";
const INDEX_NOT_FOUND: &str = "index_not_found_exception";

/// Reasons the adapter could not be brought up
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("no Elasticsearch host configured")]
    NoHosts,

    #[error("invalid Elasticsearch host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("ping to Elasticsearch at {hosts:?} failed")]
    PingFailed { hosts: Vec<String> },
}

/// Classify a failed request that never produced a response
pub(crate) fn classify_transport(err: &reqwest::Error) -> SearchError {
    if err.is_builder() {
        return SearchError::Backend {
            status: None,
            reason: format!("invalid request: {err}"),
        };
    }
    SearchError::Connection(err.to_string())
}

/// Classify a non-2xx response from the backend
///
/// Precedence: index-not-found > security > generic. The `security_exception`
/// check on the raw body is a fallback for responses without a parseable
/// error type.
pub fn classify_response(status: u16, body: &str, index: &str) -> SearchError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error_type = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let reason = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/reason").or_else(|| v.get("error")))
        .and_then(Value::as_str)
        .map(str::to_string);
    let detail = reason
        .clone()
        .or_else(|| error_type.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status == 404 || error_type.as_deref() == Some(INDEX_NOT_FOUND) {
        return SearchError::IndexNotFound {
            index: index.to_string(),
            detail,
        };
    }

    let security_typed = error_type
        .as_deref()
        .is_some_and(|t| t.contains(SECURITY_MARKER));
    if status == 401
        || status == 403
        || security_typed
        || body.to_lowercase().contains(SECURITY_MARKER)
    {
        return SearchError::Authentication(detail);
    }

    SearchError::Backend {
        status: Some(status),
        reason: error_type.or(reason).unwrap_or_else(|| format!("HTTP {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_not_found_by_status() {
        let body = r#"{"error":{"type":"index_not_found_exception","reason":"no such index [orders]"},"status":404}"#;
        let err = classify_response(404, body, "orders");
        assert_eq!(
            err,
            SearchError::IndexNotFound {
                index: "orders".to_string(),
                detail: "no such index [orders]".to_string()
            }
        );
    }

    #[test]
    fn test_index_not_found_by_type() {
        let body = r#"{"error":{"type":"index_not_found_exception","reason":"no such index"}}"#;
        assert!(matches!(
            classify_response(400, body, "orders"),
            SearchError::IndexNotFound { .. }
        ));
    }

    #[test]
    fn test_unauthorized_status() {
        assert!(matches!(
            classify_response(401, "", "orders"),
            SearchError::Authentication(_)
        ));
    }

    #[test]
    fn test_security_marker_in_error_type() {
        let body = r#"{"error":{"type":"security_exception","reason":"action [indices:data/read/search] is unauthorized"},"status":500}"#;
        assert_eq!(
            classify_response(500, body, "orders"),
            SearchError::Authentication(
                "action [indices:data/read/search] is unauthorized".to_string()
            )
        );
    }

    #[test]
    fn test_security_marker_in_unstructured_body() {
        let body = "upstream said: Security_Exception while authenticating";
        assert!(matches!(
            classify_response(502, body, "orders"),
            SearchError::Authentication(_)
        ));
    }

    #[test]
    fn test_not_found_wins_over_security_marker() {
        let body = r#"{"error":"security_exception hidden in a 404"}"#;
        assert!(matches!(
            classify_response(404, body, "orders"),
            SearchError::IndexNotFound { .. }
        ));
    }

    #[test]
    fn test_generic_uses_error_type() {
        let body = r#"{"error":{"type":"search_phase_execution_exception","reason":"all shards failed"},"status":400}"#;
        assert_eq!(
            classify_response(400, body, "orders"),
            SearchError::Backend {
                status: Some(400),
                reason: "search_phase_execution_exception".to_string()
            }
        );
    }

    #[test]
    fn test_generic_without_body() {
        assert_eq!(
            classify_response(503, "", "orders"),
            SearchError::Backend {
                status: Some(503),
                reason: "HTTP 503".to_string()
            }
        );
    }
}
