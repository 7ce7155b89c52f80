//! HTTP value types the route layer operates on.
//!
//! Pylon does not own a transport: the host framework hands it standard
//! `http` request/response values with fully buffered bodies.

use crate::ApiError;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type processed by the middleware chain.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the middleware chain.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building JSON responses.
pub trait ResponseExt {
    /// Creates a JSON response with the given status and payload.
    fn json(status: StatusCode, payload: &serde_json::Value) -> Response;

    /// Creates the uniform error-envelope response for a failure.
    fn from_error(error: &ApiError) -> Response;
}

impl ResponseExt for Response {
    fn json(status: StatusCode, payload: &serde_json::Value) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload.to_string())))
            .expect("failed to build JSON response")
    }

    fn from_error(error: &ApiError) -> Response {
        let body = serde_json::to_value(error.to_envelope())
            .expect("error envelope is always serializable");
        Self::json(error.status_code(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_sets_content_type() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn error_response_uses_failure_status() {
        let err = ApiError::method_not_allowed("Method not allowed");
        let response = Response::from_error(&err);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
