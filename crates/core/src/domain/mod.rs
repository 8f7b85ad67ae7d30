// Domain Layer - Pure search model

pub mod error;
pub mod index;
pub mod search;

// Re-exports
pub use error::DomainError;
pub use index::{IndexName, DEFAULT_INDEX_NAME};
pub use search::{
    SearchFailure, SearchFailureKind, SearchHit, SearchOutcome, SearchRequest, FUZZINESS,
    RESULT_CAP, SEARCH_FIELDS,
};
