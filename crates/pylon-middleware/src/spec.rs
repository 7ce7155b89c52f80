//! Route specifications.
//!
//! A [`RouteSpec`] is the declarative description of one endpoint: accepted
//! methods, authentication requirement, input/output schemas, extra
//! middlewares, and behavior flags. It is constructed once at
//! route-definition time, immutable thereafter, and stays attached to the
//! built route so the docs generator can introspect it.

use crate::middleware::Middleware;
use http::Method;
use pylon_core::ApiError;
use pylon_schema::Schema;
use std::fmt;
use std::sync::Arc;

/// The authentication requirement of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAuth {
    /// No authentication required; the request runs anonymously.
    None,
    /// One or more scheme names keyed into the setup's auth map, tried in
    /// declared order.
    Schemes(Vec<String>),
}

/// Custom aggregation of per-scheme auth failures.
///
/// Invoked when every configured scheme failed; receives the individual
/// failures in scheme order and produces the failure to report.
pub type AuthFailureHandler = Arc<dyn Fn(&[ApiError]) -> ApiError + Send + Sync>;

/// Declarative description of one endpoint.
///
/// # Example
///
/// ```
/// use http::Method;
/// use pylon_middleware::RouteSpec;
/// use pylon_schema::Schema;
/// use serde_json::json;
///
/// let spec = RouteSpec::builder()
///     .methods([Method::POST])
///     .auth_scheme("auth_token")
///     .json_body(Schema::compile(json!({
///         "type": "object",
///         "required": ["name"],
///         "properties": { "name": { "type": "string" } }
///     })).unwrap())
///     .build();
///
/// assert!(spec.allows(&Method::POST));
/// assert!(!spec.allows(&Method::GET));
/// ```
#[derive(Clone)]
pub struct RouteSpec {
    methods: Vec<Method>,
    auth: RouteAuth,
    json_body: Option<Schema>,
    query_params: Option<Schema>,
    common_params: Option<Schema>,
    form_data: Option<Schema>,
    json_response: Option<Schema>,
    middlewares: Vec<Arc<dyn Middleware>>,
    validate_responses: Option<bool>,
    validate_get_request_body: bool,
    exclude_from_docs: bool,
    on_auth_failure: Option<AuthFailureHandler>,
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("methods", &self.methods)
            .field("auth", &self.auth)
            .field("json_body", &self.json_body.is_some())
            .field("query_params", &self.query_params.is_some())
            .field("common_params", &self.common_params.is_some())
            .field("form_data", &self.form_data.is_some())
            .field("json_response", &self.json_response.is_some())
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl RouteSpec {
    /// Creates a new route specification builder.
    #[must_use]
    pub fn builder() -> RouteSpecBuilder {
        RouteSpecBuilder::default()
    }

    /// The accepted HTTP methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns `true` if the method is in the accepted set.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// The authentication requirement.
    #[must_use]
    pub fn auth(&self) -> &RouteAuth {
        &self.auth
    }

    /// The JSON body schema, if declared.
    #[must_use]
    pub fn json_body(&self) -> Option<&Schema> {
        self.json_body.as_ref()
    }

    /// The query-parameter schema, if declared.
    #[must_use]
    pub fn query_params(&self) -> Option<&Schema> {
        self.query_params.as_ref()
    }

    /// The common-params schema (fields accepted from query or body), if
    /// declared.
    #[must_use]
    pub fn common_params(&self) -> Option<&Schema> {
        self.common_params.as_ref()
    }

    /// The form-data schema, if declared.
    #[must_use]
    pub fn form_data(&self) -> Option<&Schema> {
        self.form_data.as_ref()
    }

    /// The response schema, if declared.
    #[must_use]
    pub fn json_response(&self) -> Option<&Schema> {
        self.json_response.as_ref()
    }

    /// Additional route middlewares, in declaration order.
    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// The route-level response-validation override.
    #[must_use]
    pub fn validate_responses(&self) -> Option<bool> {
        self.validate_responses
    }

    /// Whether GET request bodies are validated.
    #[must_use]
    pub fn validate_get_request_body(&self) -> bool {
        self.validate_get_request_body
    }

    /// Whether the route is excluded from generated documentation.
    #[must_use]
    pub fn exclude_from_docs(&self) -> bool {
        self.exclude_from_docs
    }

    /// The custom all-schemes-failed handler, if declared.
    #[must_use]
    pub fn on_auth_failure(&self) -> Option<&AuthFailureHandler> {
        self.on_auth_failure.as_ref()
    }

    /// The OpenAPI operation ID, if declared.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// The OpenAPI summary, if declared.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The OpenAPI description, if declared.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The OpenAPI tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Builder for [`RouteSpec`].
#[derive(Default)]
pub struct RouteSpecBuilder {
    methods: Vec<Method>,
    auth: Option<RouteAuth>,
    json_body: Option<Schema>,
    query_params: Option<Schema>,
    common_params: Option<Schema>,
    form_data: Option<Schema>,
    json_response: Option<Schema>,
    middlewares: Vec<Arc<dyn Middleware>>,
    validate_responses: Option<bool>,
    validate_get_request_body: bool,
    exclude_from_docs: bool,
    on_auth_failure: Option<AuthFailureHandler>,
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
}

impl RouteSpecBuilder {
    /// Sets the accepted HTTP methods.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Requires the named auth scheme.
    #[must_use]
    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth = Some(RouteAuth::Schemes(vec![scheme.into()]));
        self
    }

    /// Accepts any of the named auth schemes, tried in order.
    #[must_use]
    pub fn auth_any_of(mut self, schemes: impl IntoIterator<Item = String>) -> Self {
        self.auth = Some(RouteAuth::Schemes(schemes.into_iter().collect()));
        self
    }

    /// Declares the JSON body schema.
    #[must_use]
    pub fn json_body(mut self, schema: Schema) -> Self {
        self.json_body = Some(schema);
        self
    }

    /// Declares the query-parameter schema.
    #[must_use]
    pub fn query_params(mut self, schema: Schema) -> Self {
        self.query_params = Some(schema);
        self
    }

    /// Declares the common-params schema.
    #[must_use]
    pub fn common_params(mut self, schema: Schema) -> Self {
        self.common_params = Some(schema);
        self
    }

    /// Declares the form-data schema.
    #[must_use]
    pub fn form_data(mut self, schema: Schema) -> Self {
        self.form_data = Some(schema);
        self
    }

    /// Declares the response schema.
    #[must_use]
    pub fn json_response(mut self, schema: Schema) -> Self {
        self.json_response = Some(schema);
        self
    }

    /// Appends an additional route middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Overrides the setup's response-validation default for this route.
    #[must_use]
    pub fn validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = Some(validate);
        self
    }

    /// Opts GET requests into body validation.
    #[must_use]
    pub fn validate_get_request_body(mut self, validate: bool) -> Self {
        self.validate_get_request_body = validate;
        self
    }

    /// Excludes the route from generated documentation.
    #[must_use]
    pub fn exclude_from_docs(mut self, exclude: bool) -> Self {
        self.exclude_from_docs = exclude;
        self
    }

    /// Sets the custom all-schemes-failed handler.
    #[must_use]
    pub fn on_auth_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[ApiError]) -> ApiError + Send + Sync + 'static,
    {
        self.on_auth_failure = Some(Arc::new(handler));
        self
    }

    /// Sets the OpenAPI operation ID.
    #[must_use]
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Sets the OpenAPI summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the OpenAPI description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the OpenAPI tags.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Builds the specification.
    ///
    /// Validity (non-empty methods, schema exclusivity, resolvable auth
    /// scheme names) is checked by `build_route`, which has the setup in
    /// hand.
    #[must_use]
    pub fn build(self) -> RouteSpec {
        RouteSpec {
            methods: self.methods,
            auth: self.auth.unwrap_or(RouteAuth::None),
            json_body: self.json_body,
            query_params: self.query_params,
            common_params: self.common_params,
            form_data: self.form_data,
            json_response: self.json_response,
            middlewares: self.middlewares,
            validate_responses: self.validate_responses,
            validate_get_request_body: self.validate_get_request_body,
            exclude_from_docs: self.exclude_from_docs,
            on_auth_failure: self.on_auth_failure,
            operation_id: self.operation_id,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
        }
    }
}
