// Target index name (validated once at startup)

use super::error::{DomainError, Result};
use std::fmt;

/// Default index shipped with the Kibana e-commerce sample data set
pub const DEFAULT_INDEX_NAME: &str = "kibana_sample_data_ecommerce";

// `*` and `,` stay allowed: search targets accept patterns and lists
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '?', '"', '<', '>', '|', ' ', '#'];

/// Name of the index every search is issued against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName(String);

impl IndexName {
    /// Validate an index name using the backend's naming rules
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let name = raw.into();
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::EmptyIndexName);
        }
        if trimmed == "." || trimmed == ".." {
            return Err(DomainError::InvalidIndexName(
                trimmed.to_string(),
                "reserved name",
            ));
        }
        if trimmed.starts_with(['-', '_', '+']) {
            return Err(DomainError::InvalidIndexName(
                trimmed.to_string(),
                "must not start with '-', '_' or '+'",
            ));
        }
        if trimmed.contains(FORBIDDEN_CHARS) {
            return Err(DomainError::InvalidIndexName(
                trimmed.to_string(),
                "contains a forbidden character",
            ));
        }
        if trimmed.chars().any(|c| c.is_uppercase()) {
            return Err(DomainError::InvalidIndexName(
                trimmed.to_string(),
                "must be lowercase",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IndexName {
    fn default() -> Self {
        Self(DEFAULT_INDEX_NAME.to_string())
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index() {
        assert_eq!(IndexName::default().as_str(), "kibana_sample_data_ecommerce");
        assert_eq!(
            IndexName::parse(DEFAULT_INDEX_NAME).unwrap(),
            IndexName::default()
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let name = IndexName::parse("  products  ").unwrap();
        assert_eq!(name.as_str(), "products");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(IndexName::parse("   "), Err(DomainError::EmptyIndexName));
    }

    #[test]
    fn test_parse_rejects_invalid_names() {
        for bad in ["Products", "_hidden", "a b", "..", "x/y", "a?b"] {
            assert!(IndexName::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_allows_patterns_and_lists() {
        assert!(IndexName::parse("logs-2024.01").is_ok());
        assert!(IndexName::parse("kibana_sample_*").is_ok());
        assert!(IndexName::parse("orders,returns").is_ok());
    }
}
