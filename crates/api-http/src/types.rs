//! HTTP Request Types

/// Query-string pairs in request order
pub type QueryPairs = Vec<(String, String)>;

/// `query` parameter of `GET /search` (first occurrence, empty when absent)
pub fn search_query(pairs: &[(String, String)]) -> &str {
    pairs
        .iter()
        .find(|(key, _)| key == "query")
        .map(|(_, value)| value.as_str())
        .unwrap_or_default()
}
