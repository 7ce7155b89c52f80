//! Error types for Pylon.
//!
//! Every failure raised while processing a request is an [`ApiError`]: one
//! exception type carrying a numeric HTTP status (derived from its
//! [`ErrorKind`]), a wire-level `type` string, a human-readable message, and
//! optional structured detail. An enclosing normalization layer converts the
//! error into the uniform JSON envelope `{ "error": { "type", "message",
//! ... } }` sent to clients.
//!
//! Misconfiguration detected while *building* a route (empty method set,
//! conflicting body schemas, unknown auth scheme, an unmet middleware
//! dependency) is a [`ConfigError`] instead — those are programming errors
//! surfaced once at startup, never per-request.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Classification of a request-processing failure.
///
/// Each kind maps to a fixed wire `type` string and a default HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wrong or missing content-type header for the declared body kind.
    InvalidContentType,
    /// Unsupported array encoding used for a query key.
    InvalidQueryParams,
    /// Schema validation failure on body/query/common params, or
    /// unparseable input not attributable to the schema library.
    InvalidInput,
    /// No configured authentication method succeeded.
    Unauthorized,
    /// Verb not in the route's allowed set.
    MethodNotAllowed,
    /// Raised by handler logic; propagated through the same mechanism.
    NotFound,
    /// Response failed schema validation.
    InvalidResponse,
    /// Any uncaught, unclassified failure.
    InternalServerError,
}

impl ErrorKind {
    /// Returns the wire-level `type` string for this kind.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::InvalidContentType => "invalid_content_type",
            Self::InvalidQueryParams => "invalid_query_params",
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::NotFound => "not_found",
            Self::InvalidResponse => "invalid_response",
            Self::InternalServerError => "internal_server_error",
        }
    }

    /// Returns the default HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InvalidContentType
            | Self::InvalidQueryParams
            | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidResponse | Self::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// The uniform request-processing failure.
///
/// # Example
///
/// ```
/// use pylon_core::{ApiError, ErrorKind};
/// use http::StatusCode;
///
/// let err = ApiError::invalid_input("age must be a positive integer");
/// assert_eq!(err.kind(), ErrorKind::InvalidInput);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    /// Per-field validation detail, present for schema failures.
    validation_errors: Option<Value>,
    /// Additional structured data merged into the wire envelope.
    data: Option<Value>,
    /// The underlying cause. Never serialized to clients.
    #[source]
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Creates an error of the given kind with a message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            validation_errors: None,
            data: None,
            source: None,
        }
    }

    /// Creates an `invalid_content_type` error.
    #[must_use]
    pub fn invalid_content_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidContentType, message)
    }

    /// Creates an `invalid_query_params` error.
    #[must_use]
    pub fn invalid_query_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQueryParams, message)
    }

    /// Creates an `invalid_input` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Creates an `unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Creates a `method_not_allowed` error.
    #[must_use]
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    /// Creates a `not_found` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates an `invalid_response` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }

    /// Creates an `internal_server_error`.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    /// Creates an `internal_server_error` retaining the underlying cause.
    ///
    /// The source is available for logging but never serialized to clients.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            kind: ErrorKind::InternalServerError,
            message: message.into(),
            validation_errors: None,
            data: None,
            source: Some(source.into()),
        }
    }

    /// Attaches per-field validation detail.
    #[must_use]
    pub fn with_validation_errors(mut self, detail: Value) -> Self {
        self.validation_errors = Some(detail);
        self
    }

    /// Attaches additional structured data, merged into the wire envelope.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the per-field validation detail, if present.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&Value> {
        self.validation_errors.as_ref()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Converts this error to the serializable wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                kind: self.kind.wire_type().to_string(),
                message: self.message.clone(),
                validation_errors: self.validation_errors.clone(),
                data: self.data.clone(),
            },
        }
    }
}

/// Serializable error envelope for HTTP responses.
///
/// Wire shape: `{ "error": { "type": ..., "message": ..., ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorBody,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Wire-level failure type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field validation detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Value>,
    /// Additional structured data, spread into the error object.
    #[serde(flatten)]
    pub data: Option<Value>,
}

/// Misconfiguration detected while building a route or a middleware chain.
///
/// These are raised once, at construction time, never during request
/// handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route declared an empty method set.
    #[error("route must allow at least one HTTP method")]
    EmptyMethods,

    /// A route declared `form_data` together with `json_body` or
    /// `common_params`.
    #[error("formData cannot be combined with jsonBody or commonParams")]
    ConflictingBodySchemas,

    /// A route referenced an auth scheme missing from the setup map.
    #[error("unknown auth scheme \"{scheme}\"")]
    UnknownAuthScheme {
        /// The scheme name that failed to resolve.
        scheme: String,
    },

    /// A middleware's declared dependency was not contributed by any
    /// earlier middleware in the chain.
    #[error("middleware \"{middleware}\" requires context field \"{field}\" which no earlier middleware provides")]
    UnmetDependency {
        /// The middleware whose requirement is unmet.
        middleware: String,
        /// The missing context field.
        field: String,
    },

    /// A declared schema document failed to compile.
    #[error("invalid schema: {reason}")]
    InvalidSchema {
        /// Why compilation failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_statuses() {
        assert_eq!(
            ErrorKind::InvalidContentType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorKind::InvalidQueryParams.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorKind::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorKind::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::InvalidResponse.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::InternalServerError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn wire_types_are_snake_case() {
        assert_eq!(ErrorKind::InvalidContentType.wire_type(), "invalid_content_type");
        assert_eq!(ErrorKind::MethodNotAllowed.wire_type(), "method_not_allowed");
        assert_eq!(ErrorKind::InvalidResponse.wire_type(), "invalid_response");
    }

    #[test]
    fn envelope_serialization() {
        let err = ApiError::invalid_input("name is required")
            .with_validation_errors(serde_json::json!([{"path": "name"}]));
        let json = serde_json::to_string(&err.to_envelope()).unwrap();

        assert!(json.contains("\"type\":\"invalid_input\""));
        assert!(json.contains("\"message\":\"name is required\""));
        assert!(json.contains("\"validation_errors\""));
    }

    #[test]
    fn envelope_spreads_extra_data() {
        let err = ApiError::unauthorized("2 authentication methods failed")
            .with_data(serde_json::json!({"failed": 2}));
        let json = serde_json::to_value(err.to_envelope()).unwrap();

        assert_eq!(json["error"]["failed"], 2);
        assert!(json["error"].get("validation_errors").is_none());
    }

    #[test]
    fn internal_error_retains_source() {
        let io = std::io::Error::other("disk on fire");
        let err = ApiError::internal_with_source("Error while parsing input", io);

        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert!(std::error::Error::source(&err).is_some());
        // The source never leaks into the envelope.
        let json = serde_json::to_string(&err.to_envelope()).unwrap();
        assert!(!json.contains("disk on fire"));
    }

    #[test]
    fn config_error_names_unmet_dependency() {
        let err = ConfigError::UnmetDependency {
            middleware: "audit".to_string(),
            field: "identity".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("audit"));
        assert!(text.contains("identity"));
    }
}
