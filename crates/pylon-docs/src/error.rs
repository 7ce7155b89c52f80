//! Error types for documentation generation.

use thiserror::Error;

/// Errors that can occur during OpenAPI generation.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the OpenAPI document to JSON.
    #[error("Failed to serialize OpenAPI document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two routes were registered for the same path and method.
    #[error("Duplicate operation for {method} {path}")]
    DuplicateOperation {
        /// The HTTP method.
        method: String,
        /// The route path.
        path: String,
    },
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_error_converts() {
        let err: DocsError = serde_json::from_str::<String>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::Serialization(_)));
    }

    #[test]
    fn duplicate_operation_names_the_route() {
        let err = DocsError::DuplicateOperation {
            method: "get".to_string(),
            path: "/widgets".to_string(),
        };
        assert!(err.to_string().contains("get /widgets"));
    }
}
