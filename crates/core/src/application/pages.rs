// Page State Machine
//
// index:  available -> Form | unavailable -> Form(notice)
// search: NoBackend -> Results(error)
//         Backend & EmptyQuery -> Form(notice)
//         Backend & Query -> Invoke -> Results(hits) | Results(empty, message)

use super::search::SearchService;
use crate::domain::{SearchHit, SearchOutcome, SearchRequest};
use crate::port::span::{ATTR_ERROR, ATTR_QUERY, ATTR_RESULTS_COUNT};
use crate::port::SpanAnnotator;
use tracing::{error, warn};

pub const NOTICE_BACKEND_NOT_CONFIGURED: &str =
    "The connection to the Elasticsearch server is not configured or failed.";
pub const MSG_BACKEND_UNAVAILABLE: &str = "Unable to connect to the Elasticsearch server.";
pub const NOTICE_EMPTY_QUERY: &str = "Please enter a search keyword.";

/// Search entry form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPage {
    pub notice: Option<String>,
}

/// Results view
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPage {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

/// What the search endpoint renders
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPage {
    Form(IndexPage),
    Results(ResultsPage),
}

/// Render decision for `GET /`
///
/// A missing backend degrades the page with a notice; the form is still served.
pub fn index_page(backend_available: bool) -> IndexPage {
    if backend_available {
        return IndexPage::default();
    }

    warn!("Rendering index page while the Elasticsearch connection is inactive");
    IndexPage {
        notice: Some(NOTICE_BACKEND_NOT_CONFIGURED.to_string()),
    }
}

/// Render decision for `GET /search`
pub async fn search_page(
    service: Option<&SearchService>,
    query: &str,
    span: &dyn SpanAnnotator,
) -> SearchPage {
    let Some(service) = service else {
        error!("Search failed because the Elasticsearch connection is inactive");
        if span.is_recording() {
            span.set_error("Elasticsearch connection is inactive");
        }
        return SearchPage::Results(ResultsPage {
            query: query.to_string(),
            hits: Vec::new(),
            error: Some(MSG_BACKEND_UNAVAILABLE.to_string()),
        });
    };

    if span.is_recording() {
        span.set_attribute(ATTR_QUERY, query.into());
    }

    let request = SearchRequest::new(query);
    if request.is_empty() {
        warn!("Search skipped because the query is empty");
        return SearchPage::Form(IndexPage {
            notice: Some(NOTICE_EMPTY_QUERY.to_string()),
        });
    }

    let outcome = service.search(&request).await;

    if span.is_recording() {
        match &outcome {
            SearchOutcome::Hits(hits) => {
                span.set_attribute(ATTR_RESULTS_COUNT, hits.len().into());
            }
            SearchOutcome::Failed(failure) => {
                span.set_attribute(ATTR_ERROR, failure.message.as_str().into());
                span.set_error(&failure.message);
            }
        }
    }

    let (hits, error) = outcome.into_parts();
    SearchPage::Results(ResultsPage {
        query: query.to_string(),
        hits,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexName;
    use crate::port::search_backend::mocks::MockSearchBackend;
    use crate::port::span::mocks::RecordingSpan;
    use crate::port::{AttributeValue, SearchError};
    use serde_json::json;
    use std::sync::Arc;

    fn service_with(backend: Arc<MockSearchBackend>) -> SearchService {
        SearchService::new(backend, IndexName::default())
    }

    #[test]
    fn test_index_page_with_backend() {
        assert_eq!(index_page(true), IndexPage { notice: None });
    }

    #[test]
    fn test_index_page_without_backend_warns() {
        let page = index_page(false);
        assert_eq!(page.notice.as_deref(), Some(NOTICE_BACKEND_NOT_CONFIGURED));
    }

    #[tokio::test]
    async fn test_no_backend_renders_error_results() {
        let span = RecordingSpan::new();

        let page = search_page(None, "shirt", &span).await;

        match page {
            SearchPage::Results(results) => {
                assert_eq!(results.query, "shirt");
                assert!(results.hits.is_empty());
                assert_eq!(results.error.as_deref(), Some(MSG_BACKEND_UNAVAILABLE));
            }
            other => panic!("expected results view, got {other:?}"),
        }
        assert!(span.error().is_some());
        assert!(span.attribute(ATTR_QUERY).is_none());
    }

    #[tokio::test]
    async fn test_empty_query_renders_form_without_search() {
        let backend = Arc::new(MockSearchBackend::with_hits(vec![json!({})]));
        let service = service_with(backend.clone());
        let span = RecordingSpan::new();

        // Same branch on every repetition
        for _ in 0..3 {
            let page = search_page(Some(&service), "", &span).await;
            assert_eq!(
                page,
                SearchPage::Form(IndexPage {
                    notice: Some(NOTICE_EMPTY_QUERY.to_string())
                })
            );
        }
        assert_eq!(backend.call_count(), 0);
        assert!(span.error().is_none());
    }

    #[tokio::test]
    async fn test_successful_search_records_count() {
        let hits: Vec<_> = (0..7).map(|i| json!({"_id": i.to_string()})).collect();
        let backend = Arc::new(MockSearchBackend::with_hits(hits));
        let service = service_with(backend.clone());
        let span = RecordingSpan::new();

        let page = search_page(Some(&service), "boots", &span).await;

        let SearchPage::Results(results) = page else {
            panic!("expected results view");
        };
        assert_eq!(results.hits.len(), 7);
        assert!(results.error.is_none());
        assert_eq!(
            span.attribute(ATTR_QUERY),
            Some(AttributeValue::Str("boots".to_string()))
        );
        assert_eq!(
            span.attribute(ATTR_RESULTS_COUNT),
            Some(AttributeValue::Int(7))
        );
        assert!(span.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_search_marks_span() {
        let backend = Arc::new(MockSearchBackend::failing(SearchError::Authentication(
            "security_exception".to_string(),
        )));
        let service = service_with(backend);
        let span = RecordingSpan::new();

        let page = search_page(Some(&service), "boots", &span).await;

        let SearchPage::Results(results) = page else {
            panic!("expected results view");
        };
        assert!(results.hits.is_empty());
        let message = results.error.unwrap();
        assert_eq!(span.error().as_deref(), Some(message.as_str()));
        assert_eq!(span.attribute(ATTR_ERROR), Some(AttributeValue::Str(message)));
        assert!(span.attribute(ATTR_RESULTS_COUNT).is_none());
    }

    #[tokio::test]
    async fn test_non_recording_span_is_left_alone() {
        let backend = Arc::new(MockSearchBackend::with_hits(vec![json!({})]));
        let service = service_with(backend);
        let span = RecordingSpan::disabled();

        let page = search_page(Some(&service), "boots", &span).await;

        assert!(matches!(page, SearchPage::Results(_)));
        assert_eq!(span.attribute_count(), 0);
    }
}
