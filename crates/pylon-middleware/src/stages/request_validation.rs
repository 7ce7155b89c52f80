//! Request validation stage.
//!
//! Per-request sequence:
//!
//! 1. Content-type gate - POST/PATCH with a declared JSON body (or common
//!    params) and a non-empty payload must carry a JSON content type; a
//!    declared form-data schema requires form encoding on non-GET verbs
//! 2. Body parse against `form_data` or `json_body` (GET bodies pass
//!    through unless the route opted in)
//! 3. Query parse via the array-format parser
//! 4. Common-params parse over the union of query and body raw values
//!    (query first, body wins on collision)
//!
//! Parsed values are attached to the [`RequestContext`]; any failure is
//! translated into the uniform envelope and aborts the chain before the
//! handler runs.

use crate::context::{field, RequestContext};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::spec::RouteSpec;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::Method;
use http_body_util::{BodyExt, Full};
use pylon_core::{ApiError, ApiResult, ArrayFormats, Request, Response, ResponseExt};
use pylon_schema::{parse_query, translate, RawParams};
use serde_json::Value;
use std::sync::Arc;

/// Middleware validating and normalizing request input.
pub struct RequestValidationStage {
    spec: Arc<RouteSpec>,
    array_formats: ArrayFormats,
}

impl RequestValidationStage {
    /// Creates the stage for a route.
    #[must_use]
    pub fn new(spec: Arc<RouteSpec>, array_formats: ArrayFormats) -> Self {
        Self { spec, array_formats }
    }

    fn validate(
        &self,
        ctx: &mut RequestContext,
        parts: &http::request::Parts,
        bytes: &Bytes,
    ) -> ApiResult<()> {
        let method = &parts.method;
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());

        self.check_content_type(method, content_type, bytes)?;

        let skip_body = *method == Method::GET && !self.spec.validate_get_request_body();
        if !skip_body {
            if let Some(schema) = self.spec.form_data() {
                let raw = form_params(bytes);
                let parsed = schema
                    .parse(&Value::Object(raw))
                    .map_err(|violations| translate::invalid_input(&violations))?;
                ctx.set_body(parsed);
            } else if let Some(schema) = self.spec.json_body() {
                let value = json_body_value(bytes)?;
                let parsed = schema
                    .parse(&value)
                    .map_err(|violations| translate::invalid_input(&violations))?;
                ctx.set_body(parsed);
            }
        }

        let raw_query = parts.uri.query().unwrap_or("");

        if let Some(schema) = self.spec.query_params() {
            let input = query_params(raw_query);
            let parsed = parse_query(schema, raw_query, &input, &self.array_formats)?;
            ctx.set_query(parsed);
        }

        if let Some(schema) = self.spec.common_params() {
            let mut merged = query_params(raw_query);
            if !bytes.is_empty() && is_json(content_type) {
                if let Value::Object(body) = json_body_value(bytes)? {
                    // Body entries win on key collision.
                    for (key, value) in body {
                        merged.insert(key, value);
                    }
                }
            }
            let parsed = parse_query(schema, raw_query, &merged, &self.array_formats)?;
            ctx.set_common_params(parsed);
        }

        Ok(())
    }

    fn check_content_type(
        &self,
        method: &Method,
        content_type: Option<&str>,
        bytes: &Bytes,
    ) -> ApiResult<()> {
        let declares_json_input =
            self.spec.json_body().is_some() || self.spec.common_params().is_some();

        if (*method == Method::POST || *method == Method::PATCH)
            && declares_json_input
            && !bytes.is_empty()
            && !is_json(content_type)
        {
            return Err(ApiError::invalid_content_type(format!(
                "Expected content type \"application/json\", got \"{}\"",
                content_type.unwrap_or("none")
            )));
        }

        if self.spec.form_data().is_some() && *method != Method::GET && !is_form(content_type) {
            return Err(ApiError::invalid_content_type(format!(
                "Expected content type \"application/x-www-form-urlencoded\", got \"{}\"",
                content_type.unwrap_or("none")
            )));
        }

        Ok(())
    }
}

impl Middleware for RequestValidationStage {
    fn name(&self) -> &'static str {
        "request_validation"
    }

    fn provides(&self) -> &'static [&'static str] {
        &[field::BODY, field::QUERY, field::COMMON_PARAMS]
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            match self.validate(ctx, &parts, &bytes) {
                Ok(()) => {
                    let request = Request::from_parts(parts, Full::new(bytes));
                    next.run(ctx, request).await
                }
                Err(error) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        error = %error,
                        "request validation failed"
                    );
                    Response::from_error(&error)
                }
            }
        })
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

/// Parses the body as JSON; an empty body is `null`.
fn json_body_value(bytes: &Bytes) -> ApiResult<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|_| translate::unparseable_input())
}

/// Assembles decoded key/value pairs into the raw-params map: a repeated
/// key collects its values into an array.
fn pairs_to_params(pairs: impl Iterator<Item = (String, String)>) -> RawParams {
    let mut params = RawParams::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            Some(Value::Array(existing)) => existing.push(Value::String(value)),
            Some(single) => {
                let first = single.take();
                *single = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                params.insert(key, Value::String(value));
            }
        }
    }
    params
}

fn query_params(raw_query: &str) -> RawParams {
    pairs_to_params(
        url::form_urlencoded::parse(raw_query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned())),
    )
}

fn form_params(bytes: &Bytes) -> RawParams {
    pairs_to_params(
        url::form_urlencoded::parse(bytes).map(|(k, v)| (k.into_owned(), v.into_owned())),
    )
}
