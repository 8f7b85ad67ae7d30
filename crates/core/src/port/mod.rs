// Port Layer - Interfaces for external dependencies

pub mod search_backend;
pub mod span; // Request span annotation

// Re-exports
pub use search_backend::{SearchBackend, SearchError};
pub use span::{AttributeValue, NoopSpan, SpanAnnotator};
