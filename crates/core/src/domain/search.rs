// Search Domain Model

use serde::Serialize;
use serde_json::{json, Value};

/// Fields the free-text query is matched against
pub const SEARCH_FIELDS: [&str; 5] = [
    "customer_full_name",
    "email",
    "products.product_name",
    "category",
    "manufacturer",
];

/// Typo tolerance passed to the backend
pub const FUZZINESS: &str = "AUTO";

/// Maximum number of hits returned per search
pub const RESULT_CAP: usize = 50;

/// A hit document exactly as returned by the backend (opaque)
pub type SearchHit = Value;

/// A single free-text search over the fixed field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Backend query body: multi-field fuzzy match capped at `RESULT_CAP` hits
    pub fn to_body(&self) -> Value {
        json!({
            "query": {
                "multi_match": {
                    "query": self.query,
                    "fields": SEARCH_FIELDS,
                    "fuzziness": FUZZINESS,
                }
            },
            "size": RESULT_CAP,
        })
    }
}

/// Classified reason a search attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailureKind {
    Connection,
    IndexNotFound,
    Authentication,
    Generic,
}

impl std::fmt::Display for SearchFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchFailureKind::Connection => write!(f, "connection"),
            SearchFailureKind::IndexNotFound => write!(f, "index_not_found"),
            SearchFailureKind::Authentication => write!(f, "authentication"),
            SearchFailureKind::Generic => write!(f, "generic"),
        }
    }
}

/// Failure shown to the caller: a kind plus a sanitized sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub kind: SearchFailureKind,
    pub message: String,
}

/// Result of one search attempt: hits or a failure, never both
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Hits(Vec<SearchHit>),
    Failed(SearchFailure),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Hits(hits) => hits,
            SearchOutcome::Failed(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&SearchFailure> {
        match self {
            SearchOutcome::Hits(_) => None,
            SearchOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Split into the (hits, error message) pair the results view renders
    pub fn into_parts(self) -> (Vec<SearchHit>, Option<String>) {
        match self {
            SearchOutcome::Hits(hits) => (hits, None),
            SearchOutcome::Failed(failure) => (Vec::new(), Some(failure.message)),
        }
    }
}
