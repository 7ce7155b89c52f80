//! Route construction.
//!
//! [`build_route`] composes the full chain around a handler:
//!
//! ```text
//! globals → auth → method check → request validation
//!         → route middlewares → response validation → handler
//! ```
//!
//! Misconfiguration (empty method set, conflicting body schemas, unknown
//! auth scheme, unmet middleware dependency) fails here, once, with a
//! [`ConfigError`] - never at request time. The built [`Route`] keeps its
//! [`RouteSpec`] and [`SetupParams`] attached for generator introspection.

use crate::chain::{BoxedMiddleware, Chain};
use crate::context::RequestContext;
use crate::middleware::BoxFuture;
use crate::setup::{Authenticator, SetupParams, NO_AUTH};
use crate::spec::{RouteAuth, RouteSpec};
use crate::stages::{
    AuthStage, MethodCheckStage, RequestValidationStage, ResponseValidationStage,
};
use pylon_core::{ApiResult, ConfigError, Request, Response, ResponseExt};
use std::sync::Arc;

/// The user-supplied handler terminating a route's chain.
///
/// Invoked with the enriched context; reads of parsed input
/// (`ctx.body()`, `ctx.common_params()`, ...) happen synchronously before
/// the returned future is awaited. An `Err` is normalized into the uniform
/// error envelope.
pub type RouteHandler = Arc<
    dyn Fn(&mut RequestContext, Request) -> BoxFuture<'static, ApiResult<Response>>
        + Send
        + Sync,
>;

/// A fully composed route.
pub struct Route {
    spec: Arc<RouteSpec>,
    setup: Arc<SetupParams>,
    chain: Chain,
    handler: RouteHandler,
}

impl Route {
    /// The specification this route was built from.
    #[must_use]
    pub fn spec(&self) -> &Arc<RouteSpec> {
        &self.spec
    }

    /// The setup this route was built from.
    #[must_use]
    pub fn setup(&self) -> &Arc<SetupParams> {
        &self.setup
    }

    /// The stage names of the composed chain, in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.stage_names()
    }

    /// Processes one request through the chain.
    pub async fn handle(&self, request: Request) -> Response {
        let ctx = RequestContext::new();
        let handler = Arc::clone(&self.handler);

        self.chain
            .process(ctx, request, move |ctx, request| {
                let outcome = handler(ctx, request);
                let request_id = ctx.request_id();
                Box::pin(async move {
                    match outcome.await {
                        Ok(response) => response,
                        Err(error) => {
                            if error.status_code().is_server_error() {
                                tracing::error!(%request_id, error = %error, "handler failed");
                            } else {
                                tracing::warn!(%request_id, error = %error, "handler rejected request");
                            }
                            Response::from_error(&error)
                        }
                    }
                })
            })
            .await
    }
}

/// Builds a route from a setup, a specification, and a handler.
///
/// # Errors
///
/// - [`ConfigError::EmptyMethods`] when no method is allowed
/// - [`ConfigError::ConflictingBodySchemas`] when `form_data` is combined
///   with `json_body` or `common_params`
/// - [`ConfigError::UnknownAuthScheme`] when a declared scheme is missing
///   from the setup map
/// - [`ConfigError::UnmetDependency`] when a middleware's requirement is
///   not provided earlier in the chain
///
/// # Example
///
/// ```
/// use http::Method;
/// use pylon_middleware::{build_route, RequestContext, RouteSpec, SetupParams};
/// use pylon_core::{Request, Response, ResponseExt};
///
/// let setup = SetupParams::builder("demo-api").build();
/// let spec = RouteSpec::builder().methods([Method::GET]).build();
///
/// let route = build_route(&setup, spec, |_ctx: &mut RequestContext, _req: Request| {
///     Box::pin(async {
///         Ok(Response::json(http::StatusCode::OK, &serde_json::json!({"ok": true})))
///     })
/// })
/// .unwrap();
///
/// assert!(route.spec().allows(&Method::GET));
/// ```
pub fn build_route<H>(
    setup: &Arc<SetupParams>,
    spec: RouteSpec,
    handler: H,
) -> Result<Route, ConfigError>
where
    H: Fn(&mut RequestContext, Request) -> BoxFuture<'static, ApiResult<Response>>
        + Send
        + Sync
        + 'static,
{
    if spec.methods().is_empty() {
        return Err(ConfigError::EmptyMethods);
    }

    if spec.form_data().is_some()
        && (spec.json_body().is_some() || spec.common_params().is_some())
    {
        return Err(ConfigError::ConflictingBodySchemas);
    }

    let authenticators = resolve_authenticators(setup, spec.auth())?;

    let spec = Arc::new(spec);
    let mut stages: Vec<BoxedMiddleware> = Vec::new();

    stages.extend(setup.global_middlewares().iter().cloned());
    stages.push(Arc::new(AuthStage::new(
        authenticators,
        spec.on_auth_failure().cloned(),
    )));
    stages.push(Arc::new(MethodCheckStage::new(spec.methods().to_vec())));
    stages.push(Arc::new(RequestValidationStage::new(
        Arc::clone(&spec),
        setup.array_formats().clone(),
    )));
    stages.extend(spec.middlewares().iter().cloned());

    if resolve_validate_responses(&spec, setup) {
        stages.push(Arc::new(ResponseValidationStage::new(
            Arc::clone(&spec),
            Arc::clone(setup),
        )));
    }

    let chain = Chain::new(stages)?;

    Ok(Route {
        spec,
        setup: Arc::clone(setup),
        chain,
        handler: Arc::new(handler),
    })
}

/// Resolves the route's auth declaration against the setup map.
fn resolve_authenticators(
    setup: &SetupParams,
    auth: &RouteAuth,
) -> Result<Vec<(String, Arc<dyn Authenticator>)>, ConfigError> {
    let scheme_names: Vec<String> = match auth {
        RouteAuth::None => vec![NO_AUTH.to_string()],
        RouteAuth::Schemes(names) => names.clone(),
    };

    scheme_names
        .into_iter()
        .map(|name| {
            setup
                .auth_schemes()
                .get(&name)
                .map(|authenticator| (name.clone(), Arc::clone(authenticator)))
                .ok_or(ConfigError::UnknownAuthScheme { scheme: name })
        })
        .collect()
}

/// Route override, else setup default.
fn resolve_validate_responses(spec: &RouteSpec, setup: &SetupParams) -> bool {
    spec.validate_responses().unwrap_or_else(|| setup.validate_responses())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use pylon_schema::Schema;
    use serde_json::json;

    fn ok_handler(
        _ctx: &mut RequestContext,
        _req: Request,
    ) -> BoxFuture<'static, ApiResult<Response>> {
        Box::pin(async { Ok(Response::json(StatusCode::OK, &json!({"done": true}))) })
    }

    fn get_request() -> Request {
        http::Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn empty_methods_are_rejected() {
        let setup = SetupParams::builder("t").build();
        let spec = RouteSpec::builder().build();

        assert!(matches!(
            build_route(&setup, spec, ok_handler),
            Err(ConfigError::EmptyMethods)
        ));
    }

    #[test]
    fn form_data_conflicts_with_json_body() {
        let setup = SetupParams::builder("t").build();
        let schema = || Schema::compile(json!({ "type": "object" })).unwrap();
        let spec = RouteSpec::builder()
            .methods([Method::POST])
            .form_data(schema())
            .json_body(schema())
            .build();

        assert!(matches!(
            build_route(&setup, spec, ok_handler),
            Err(ConfigError::ConflictingBodySchemas)
        ));
    }

    #[test]
    fn form_data_conflicts_with_common_params() {
        let setup = SetupParams::builder("t").build();
        let schema = || Schema::compile(json!({ "type": "object" })).unwrap();
        let spec = RouteSpec::builder()
            .methods([Method::POST])
            .form_data(schema())
            .common_params(schema())
            .build();

        assert!(matches!(
            build_route(&setup, spec, ok_handler),
            Err(ConfigError::ConflictingBodySchemas)
        ));
    }

    #[test]
    fn unknown_auth_scheme_is_rejected() {
        let setup = SetupParams::builder("t").build();
        let spec = RouteSpec::builder()
            .methods([Method::GET])
            .auth_scheme("no_such_scheme")
            .build();

        match build_route(&setup, spec, ok_handler) {
            Err(ConfigError::UnknownAuthScheme { scheme }) => {
                assert_eq!(scheme, "no_such_scheme");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn stage_order_is_fixed() {
        let setup = SetupParams::builder("t").validate_responses(true).build();
        let spec = RouteSpec::builder().methods([Method::GET]).build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        assert_eq!(
            route.stage_names(),
            vec![
                "auth",
                "method_check",
                "request_validation",
                "response_validation"
            ]
        );
    }

    #[test]
    fn response_validation_stage_absent_when_disabled() {
        let setup = SetupParams::builder("t").build();
        let spec = RouteSpec::builder().methods([Method::GET]).build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        assert!(!route.stage_names().contains(&"response_validation"));
    }

    #[test]
    fn route_override_beats_setup_default() {
        let setup = SetupParams::builder("t").validate_responses(true).build();
        let spec = RouteSpec::builder()
            .methods([Method::GET])
            .validate_responses(false)
            .build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        assert!(!route.stage_names().contains(&"response_validation"));
    }

    #[tokio::test]
    async fn handler_success_flows_through() {
        let setup = SetupParams::builder("t").build();
        let spec = RouteSpec::builder().methods([Method::GET]).build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        let response = route.handle(get_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handler_error_is_normalized() {
        use http_body_util::BodyExt;
        use pylon_core::ApiError;

        let setup = SetupParams::builder("t").build();
        let spec = RouteSpec::builder().methods([Method::GET]).build();
        let route = build_route(&setup, spec, |_ctx: &mut RequestContext, _req: Request| {
            Box::pin(async { Err(ApiError::not_found("no such widget")) })
        })
        .unwrap();

        let response = route.handle(get_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "not_found");
        assert_eq!(body["error"]["message"], "no such widget");
    }

    #[tokio::test]
    async fn route_exposes_its_metadata() {
        let setup = SetupParams::builder("metadata-api").build();
        let spec = RouteSpec::builder()
            .methods([Method::GET])
            .operation_id("listWidgets")
            .build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        assert_eq!(route.setup().api_name(), "metadata-api");
        assert_eq!(route.spec().operation_id(), Some("listWidgets"));
    }
}
