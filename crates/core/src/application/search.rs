// Search Use Case

use crate::domain::{
    IndexName, SearchFailure, SearchFailureKind, SearchOutcome, SearchRequest,
};
use crate::port::{SearchBackend, SearchError};
use std::sync::Arc;
use tracing::{error, info};

pub const MSG_CONNECTION_FAILED: &str =
    "Failed to connect to Elasticsearch while performing the search.";
pub const MSG_AUTHENTICATION_FAILED: &str =
    "Authentication error while contacting Elasticsearch. Check the configured credentials.";

/// Search service bound to one backend and one index
///
/// Built once at startup when the backend answered its liveness check.
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    index: IndexName,
}

impl SearchService {
    pub fn new(backend: Arc<dyn SearchBackend>, index: IndexName) -> Self {
        Self { backend, index }
    }

    pub fn index(&self) -> &IndexName {
        &self.index
    }

    pub fn hosts(&self) -> Vec<String> {
        self.backend.hosts()
    }

    /// Execute a search and classify any failure
    ///
    /// The full backend error is logged here; the returned outcome only
    /// carries the sanitized message meant for the caller.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        info!(query = %request.query(), index = %self.index, "Performing search");

        let body = request.to_body();
        match self.backend.search(&self.index, &body).await {
            Ok(hits) => {
                info!(
                    query = %request.query(),
                    results = hits.len(),
                    "Search succeeded"
                );
                SearchOutcome::Hits(hits)
            }
            Err(err) => {
                let failure = self.classify(&err);
                error!(
                    error = %err,
                    kind = %failure.kind,
                    query = %request.query(),
                    index = %self.index,
                    "{}",
                    failure.message
                );
                SearchOutcome::Failed(failure)
            }
        }
    }

    /// Map a typed backend error to the caller-facing failure
    pub fn classify(&self, err: &SearchError) -> SearchFailure {
        match err {
            SearchError::Connection(_) => SearchFailure {
                kind: SearchFailureKind::Connection,
                message: MSG_CONNECTION_FAILED.to_string(),
            },
            SearchError::IndexNotFound { .. } => SearchFailure {
                kind: SearchFailureKind::IndexNotFound,
                message: format!("Index '{}' was not found in Elasticsearch.", self.index),
            },
            SearchError::Authentication(_) => SearchFailure {
                kind: SearchFailureKind::Authentication,
                message: MSG_AUTHENTICATION_FAILED.to_string(),
            },
            SearchError::Backend { reason, .. } => SearchFailure {
                kind: SearchFailureKind::Generic,
                message: format!("An error occurred while performing the search: {reason}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::search_backend::mocks::MockSearchBackend;
    use serde_json::json;

    fn service(backend: MockSearchBackend) -> (SearchService, Arc<MockSearchBackend>) {
        let backend = Arc::new(backend);
        let service = SearchService::new(backend.clone(), IndexName::default());
        (service, backend)
    }

    #[tokio::test]
    async fn test_search_returns_hits() {
        let (service, backend) = service(MockSearchBackend::with_hits(vec![
            json!({"_id": "1"}),
            json!({"_id": "2"}),
        ]));

        let outcome = service.search(&SearchRequest::new("eddie")).await;

        assert_eq!(outcome.hits().len(), 2);
        assert_eq!(backend.call_count(), 1);
        let body = backend.last_body().unwrap();
        assert_eq!(body["query"]["multi_match"]["query"], "eddie");
    }

    #[tokio::test]
    async fn test_connection_failure_is_sanitized() {
        let (service, _) = service(MockSearchBackend::failing(SearchError::Connection(
            "tcp connect error: 10.0.0.7:9200 refused".to_string(),
        )));

        let outcome = service.search(&SearchRequest::new("shoes")).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, SearchFailureKind::Connection);
        assert_eq!(failure.message, MSG_CONNECTION_FAILED);
        assert!(!failure.message.contains("10.0.0.7"));
    }

    #[tokio::test]
    async fn test_index_not_found_names_index() {
        let (service, _) = service(MockSearchBackend::failing(SearchError::IndexNotFound {
            index: "kibana_sample_data_ecommerce".to_string(),
            detail: "no such index".to_string(),
        }));

        let outcome = service.search(&SearchRequest::new("shoes")).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, SearchFailureKind::IndexNotFound);
        assert_eq!(
            failure.message,
            "Index 'kibana_sample_data_ecommerce' was not found in Elasticsearch."
        );
    }

    #[tokio::test]
    async fn test_authentication_failure_message() {
        let (service, _) = service(MockSearchBackend::failing(SearchError::Authentication(
            "security_exception: missing authentication credentials".to_string(),
        )));

        let outcome = service.search(&SearchRequest::new("shoes")).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, SearchFailureKind::Authentication);
        assert_eq!(failure.message, MSG_AUTHENTICATION_FAILED);
    }

    #[tokio::test]
    async fn test_generic_failure_carries_reason() {
        let (service, _) = service(MockSearchBackend::failing(SearchError::Backend {
            status: Some(400),
            reason: "search_phase_execution_exception".to_string(),
        }));

        let outcome = service.search(&SearchRequest::new("shoes")).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, SearchFailureKind::Generic);
        assert_eq!(
            failure.message,
            "An error occurred while performing the search: search_phase_execution_exception"
        );
    }
}
