// Application Layer - Use Cases

pub mod pages;
pub mod search;

// Re-exports
pub use pages::{index_page, search_page, IndexPage, ResultsPage, SearchPage};
pub use search::SearchService;
