// Search Backend Port
// Abstraction over the document store queried by the search page
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{IndexName, SearchHit};

/// Typed failure of a single backend call
///
/// Adapters resolve transport and backend errors into one of these kinds;
/// the application layer never inspects raw error text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Index '{index}' not found: {detail}")]
    IndexNotFound { index: String, detail: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Backend error (status {status:?}): {reason}")]
    Backend { status: Option<u16>, reason: String },
}

/// Search backend trait
///
/// Implementations:
/// - ElasticsearchClient: HTTP client for an Elasticsearch cluster
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a query body against an index and return the raw hit documents
    ///
    /// # Errors
    /// - SearchError::Connection if no response was received
    /// - SearchError::IndexNotFound if the index does not exist
    /// - SearchError::Authentication if the backend rejected the credentials
    /// - SearchError::Backend for any other backend failure
    async fn search(&self, index: &IndexName, body: &Value) -> Result<Vec<SearchHit>, SearchError>;

    /// Hosts this backend talks to (for logging)
    fn hosts(&self) -> Vec<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    /// Mock backend behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return these hits
        Hits(Vec<SearchHit>),
        /// Fail with this error
        Fail(SearchError),
    }
    /// Mock Search Backend for testing
    pub struct MockSearchBackend {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
        last_body: Arc<Mutex<Option<Value>>>,
    }
    impl MockSearchBackend {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
                last_body: Arc::new(Mutex::new(None)),
            }
        }
        pub fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self::new(MockBehavior::Hits(hits))
        }
        pub fn failing(error: SearchError) -> Self {
            Self::new(MockBehavior::Fail(error))
        }
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
        pub fn last_body(&self) -> Option<Value> {
            self.last_body.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl SearchBackend for MockSearchBackend {
        async fn search(
            &self,
            _index: &IndexName,
            body: &Value,
        ) -> Result<Vec<SearchHit>, SearchError> {
            *self.call_count.lock().unwrap() += 1;
            *self.last_body.lock().unwrap() = Some(body.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Hits(hits) => Ok(hits),
                MockBehavior::Fail(err) => Err(err),
            }
        }
        fn hosts(&self) -> Vec<String> {
            vec!["http://mock:9200".to_string()]
        }
    }
}
