//! Error types for query context handling
//!
//! The cache itself never fails. These errors belong to the layers around it:
//! decoding server payloads, encoding requests and loading session configuration.

use thiserror::Error;

/// Main error type for query context operations
#[derive(Error, Debug)]
pub enum QueryContextError {
    /// A response entry had a field of the wrong type
    #[error("Invalid query context entry at index {index}: `{field}` {reason}")]
    InvalidEntry {
        index: usize,
        field: &'static str,
        reason: String,
    },

    /// The payload as a whole did not have the expected shape
    #[error("Invalid query context payload: {0}")]
    InvalidPayload(String),

    /// The opaque context was not valid base64
    #[error("Invalid base64 context for id {id}: {source}")]
    ContextDecodeError {
        id: u64,
        #[source]
        source: base64::DecodeError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for query context operations
pub type Result<T> = std::result::Result<T, QueryContextError>;

impl From<String> for QueryContextError {
    fn from(s: String) -> Self {
        QueryContextError::Other(s)
    }
}

impl From<&str> for QueryContextError {
    fn from(s: &str) -> Self {
        QueryContextError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = QueryContextError::InvalidEntry {
            index: 2,
            field: "priority",
            reason: "is not an unsigned integer".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid query context entry at index 2: `priority` is not an unsigned integer"
        );

        let config_error = QueryContextError::ConfigError("capacity must be positive".to_string());
        assert!(config_error.to_string().contains("capacity must be positive"));
    }

    #[test]
    fn test_error_conversion() {
        let error: QueryContextError = "test error".into();
        assert!(matches!(error, QueryContextError::Other(_)));

        let error: QueryContextError = "test error".to_string().into();
        assert!(matches!(error, QueryContextError::Other(_)));

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: QueryContextError = json_error.into();
        assert!(matches!(error, QueryContextError::SerializationError(_)));
    }
}
