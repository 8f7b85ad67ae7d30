// Span Annotation Port
// The application layer annotates the active request span through this trait,
// so it stays independent of the tracing/OpenTelemetry stack.

/// Attribute key for the raw query text
pub const ATTR_QUERY: &str = "app.search.query";
/// Attribute key for the number of hits returned
pub const ATTR_RESULTS_COUNT: &str = "app.search.results_count";
/// Attribute key for the sanitized error message
pub const ATTR_ERROR: &str = "app.search.error";

/// Value recorded on a span attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Handle on the span of the request being served
pub trait SpanAnnotator: Send + Sync {
    /// Whether annotations will be kept (false when tracing is inert)
    fn is_recording(&self) -> bool;

    /// Record an attribute on the span
    ///
    /// The `ATTR_*` keys above are declared on the server span up front and
    /// land as span fields. Any other key is still exported as a span
    /// attribute, but never shows up in fields read by log layers.
    fn set_attribute(&self, key: &'static str, value: AttributeValue);

    /// Set the span status to error with a description
    fn set_error(&self, description: &str);
}

/// Span that records nothing (instrumentation detached)
pub struct NoopSpan;

impl SpanAnnotator for NoopSpan {
    fn is_recording(&self) -> bool {
        false
    }

    fn set_attribute(&self, _key: &'static str, _value: AttributeValue) {}

    fn set_error(&self, _description: &str) {}
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;
    /// Span that keeps every annotation for assertions
    pub struct RecordingSpan {
        recording: bool,
        attributes: Mutex<Vec<(&'static str, AttributeValue)>>,
        error: Mutex<Option<String>>,
    }
    impl RecordingSpan {
        pub fn new() -> Self {
            Self {
                recording: true,
                attributes: Mutex::new(Vec::new()),
                error: Mutex::new(None),
            }
        }
        /// A span that reports itself as not recording
        pub fn disabled() -> Self {
            Self {
                recording: false,
                ..Self::new()
            }
        }
        pub fn attribute(&self, key: &str) -> Option<AttributeValue> {
            self.attributes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        }
        pub fn attribute_count(&self) -> usize {
            self.attributes.lock().unwrap().len()
        }
        pub fn error(&self) -> Option<String> {
            self.error.lock().unwrap().clone()
        }
    }
    impl Default for RecordingSpan {
        fn default() -> Self {
            Self::new()
        }
    }
    impl SpanAnnotator for RecordingSpan {
        fn is_recording(&self) -> bool {
            self.recording
        }
        fn set_attribute(&self, key: &'static str, value: AttributeValue) {
            if self.recording {
                self.attributes.lock().unwrap().push((key, value));
            }
        }
        fn set_error(&self, description: &str) {
            if self.recording {
                *self.error.lock().unwrap() = Some(description.to_string());
            }
        }
    }
}
