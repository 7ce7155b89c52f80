//! Response validation stage.
//!
//! Installed innermost - directly wrapping the handler - and only when
//! response validation resolves enabled for the route. The handler's send
//! path is wrapped functionally: the stage buffers the outgoing payload,
//! optionally merges the automatic `ok` field, and schema-checks 2xx
//! payloads before they leave. Non-2xx responses bypass validation
//! entirely; their envelopes were produced by the error path already.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::setup::SetupParams;
use crate::spec::RouteSpec;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use pylon_core::{ApiError, Request, Response, ResponseExt};
use serde_json::Value;
use std::sync::Arc;

/// Middleware validating outgoing response payloads.
pub struct ResponseValidationStage {
    spec: Arc<RouteSpec>,
    setup: Arc<SetupParams>,
}

impl ResponseValidationStage {
    /// Creates the stage for a route.
    #[must_use]
    pub fn new(spec: Arc<RouteSpec>, setup: Arc<SetupParams>) -> Self {
        Self { spec, setup }
    }
}

impl Middleware for ResponseValidationStage {
    fn name(&self) -> &'static str {
        "response_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;

            let (mut parts, body) = response.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let mut payload: Option<Value> = if bytes.is_empty() {
                None
            } else {
                serde_json::from_slice(&bytes).ok()
            };

            // The automatic `ok` field reflects whether the final status is
            // in the success range, and participates in the schema check.
            let mut injected = false;
            if self.setup.ok_field_applies(&self.spec) {
                if let Some(Value::Object(object)) = payload.as_mut() {
                    object.insert("ok".to_string(), Value::Bool(parts.status.is_success()));
                    injected = true;
                }
            }

            if parts.status.is_success() {
                if let Some(schema) = self.spec.json_response() {
                    let candidate = payload.clone().unwrap_or(Value::Null);
                    if let Err(violations) = schema.parse(&candidate) {
                        tracing::error!(
                            request_id = %ctx.request_id(),
                            issues = violations.issues.len(),
                            "response failed schema validation"
                        );
                        let error = ApiError::invalid_response(
                            "the response does not match with jsonResponse",
                        );
                        return Response::from_error(&error);
                    }
                }
            }

            let body_bytes = match payload {
                Some(value) if injected => {
                    // The payload changed; the original framing no longer
                    // holds.
                    parts.headers.remove(http::header::CONTENT_LENGTH);
                    Bytes::from(value.to_string())
                }
                _ => bytes,
            };

            Response::from_parts(parts, Full::new(body_bytes))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use pylon_schema::Schema;
    use serde_json::json;

    fn response_schema() -> Schema {
        Schema::compile(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "ok": { "type": "boolean" }
            }
        }))
        .unwrap()
    }

    fn spec_with_response_schema() -> Arc<RouteSpec> {
        Arc::new(
            RouteSpec::builder()
                .methods([Method::GET])
                .json_response(response_schema())
                .build(),
        )
    }

    fn empty_request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn responder(
        status: StatusCode,
        body: Value,
    ) -> impl FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send {
        move |_ctx, _req| {
            Box::pin(async move {
                http::Response::builder()
                    .status(status)
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Full::new(Bytes::from(body.to_string())))
                    .unwrap()
            })
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn valid_success_payload_passes() {
        let stage = ResponseValidationStage::new(
            spec_with_response_schema(),
            SetupParams::builder("t").build(),
        );

        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::OK, json!({"name": "a"}))),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"name": "a"}));
    }

    #[tokio::test]
    async fn invalid_success_payload_becomes_500() {
        let stage = ResponseValidationStage::new(
            spec_with_response_schema(),
            SetupParams::builder("t").build(),
        );

        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::OK, json!({"wrong": 1}))),
            )
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_response");
        assert_eq!(
            body["error"]["message"],
            "the response does not match with jsonResponse"
        );
    }

    #[tokio::test]
    async fn non_success_statuses_bypass_validation() {
        let stage = ResponseValidationStage::new(
            spec_with_response_schema(),
            SetupParams::builder("t").build(),
        );

        // The same payload that fails under 200 sails through under 404.
        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::NOT_FOUND, json!({"wrong": 1}))),
            )
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"wrong": 1}));
    }

    #[tokio::test]
    async fn ok_field_is_injected_and_schema_checked() {
        let stage = ResponseValidationStage::new(
            spec_with_response_schema(),
            SetupParams::builder("t").inject_ok_field(true).build(),
        );

        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::OK, json!({"name": "a"}))),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"name": "a", "ok": true}));
    }

    #[tokio::test]
    async fn ok_field_is_false_on_error_statuses() {
        let stage = ResponseValidationStage::new(
            spec_with_response_schema(),
            SetupParams::builder("t").inject_ok_field(true).build(),
        );

        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::NOT_FOUND, json!({"wrong": 1}))),
            )
            .await;

        assert_eq!(
            body_json(response).await,
            json!({"wrong": 1, "ok": false})
        );
    }

    #[tokio::test]
    async fn missing_response_schema_skips_the_check() {
        let spec = Arc::new(RouteSpec::builder().methods([Method::GET]).build());
        let stage = ResponseValidationStage::new(spec, SetupParams::builder("t").build());

        let response = stage
            .process(
                &mut RequestContext::new(),
                empty_request(),
                Next::handler(responder(StatusCode::OK, json!({"anything": 1}))),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
