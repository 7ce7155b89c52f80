//! Project-wide setup parameters.
//!
//! [`SetupParams`] is created once at module load and shared by reference
//! across every route built from it. Nothing in it is mutated during
//! request handling: the auth-scheme map is built once (and always contains
//! the no-op [`NO_AUTH`] entry) rather than being patched at call time.

use crate::middleware::{BoxFuture, Middleware};
use crate::spec::RouteSpec;
use pylon_core::{ApiError, ArrayFormats, Identity, Request};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The scheme name every setup maps to the no-op authenticator.
pub const NO_AUTH: &str = "none";

/// An authentication method keyed by name in [`SetupParams`].
///
/// Authenticators are capabilities, not full middlewares: the auth stage
/// tries each of a route's configured schemes in order and keeps the first
/// success, which a short-circuiting middleware contract cannot express.
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticates the request, producing the caller identity.
    ///
    /// # Errors
    ///
    /// An `unauthorized` [`ApiError`] describing why this method rejected
    /// the request.
    fn authenticate<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Identity, ApiError>>;
}

/// The no-op authenticator behind [`NO_AUTH`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn authenticate<'a>(
        &'a self,
        _request: &'a Request,
    ) -> BoxFuture<'a, Result<Identity, ApiError>> {
        Box::pin(async { Ok(Identity::Anonymous) })
    }
}

/// Suppression predicate for automatic `ok`-field injection.
pub type OkFieldPredicate = Arc<dyn Fn(&RouteSpec) -> bool + Send + Sync>;

/// Project-wide configuration shared by all routes.
///
/// # Example
///
/// ```
/// use pylon_middleware::SetupParams;
///
/// let setup = SetupParams::builder("orders-api").build();
/// assert!(setup.auth_schemes().contains_key("none"));
/// ```
pub struct SetupParams {
    api_name: String,
    version: String,
    base_url: Option<String>,
    description: Option<String>,
    auth_schemes: BTreeMap<String, Arc<dyn Authenticator>>,
    global_middlewares: Vec<Arc<dyn Middleware>>,
    security_schemes: BTreeMap<String, Value>,
    array_formats: ArrayFormats,
    validate_responses: bool,
    inject_ok_field: bool,
    suppress_ok_field: Option<OkFieldPredicate>,
}

impl fmt::Debug for SetupParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupParams")
            .field("api_name", &self.api_name)
            .field("version", &self.version)
            .field("auth_schemes", &self.auth_schemes.keys().collect::<Vec<_>>())
            .field("global_middlewares", &self.global_middlewares.len())
            .field("array_formats", &self.array_formats)
            .field("validate_responses", &self.validate_responses)
            .field("inject_ok_field", &self.inject_ok_field)
            .finish_non_exhaustive()
    }
}

impl SetupParams {
    /// Creates a new setup builder.
    #[must_use]
    pub fn builder(api_name: impl Into<String>) -> SetupParamsBuilder {
        SetupParamsBuilder::new(api_name)
    }

    /// The API name, used by the docs generator.
    #[must_use]
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// The API version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The API base URL, if declared.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// The API description, if declared.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The auth-scheme map. Always contains [`NO_AUTH`].
    #[must_use]
    pub fn auth_schemes(&self) -> &BTreeMap<String, Arc<dyn Authenticator>> {
        &self.auth_schemes
    }

    /// Middlewares applied to every route, before route-specific ones.
    #[must_use]
    pub fn global_middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.global_middlewares
    }

    /// OpenAPI security scheme descriptions keyed by scheme name.
    #[must_use]
    pub fn security_schemes(&self) -> &BTreeMap<String, Value> {
        &self.security_schemes
    }

    /// The query-array encodings accepted by routes built from this setup.
    #[must_use]
    pub fn array_formats(&self) -> &ArrayFormats {
        &self.array_formats
    }

    /// The default response-validation behavior.
    #[must_use]
    pub fn validate_responses(&self) -> bool {
        self.validate_responses
    }

    /// Whether the automatic `ok` response field is enabled.
    #[must_use]
    pub fn inject_ok_field(&self) -> bool {
        self.inject_ok_field
    }

    /// Returns `true` when `ok`-field injection applies to the route.
    #[must_use]
    pub fn ok_field_applies(&self, spec: &RouteSpec) -> bool {
        if !self.inject_ok_field {
            return false;
        }
        match &self.suppress_ok_field {
            Some(suppress) => !suppress(spec),
            None => true,
        }
    }
}

/// Builder for [`SetupParams`].
pub struct SetupParamsBuilder {
    api_name: String,
    version: String,
    base_url: Option<String>,
    description: Option<String>,
    auth_schemes: BTreeMap<String, Arc<dyn Authenticator>>,
    global_middlewares: Vec<Arc<dyn Middleware>>,
    security_schemes: BTreeMap<String, Value>,
    array_formats: ArrayFormats,
    validate_responses: bool,
    inject_ok_field: bool,
    suppress_ok_field: Option<OkFieldPredicate>,
}

impl SetupParamsBuilder {
    fn new(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            version: "0.1.0".to_string(),
            base_url: None,
            description: None,
            auth_schemes: BTreeMap::new(),
            global_middlewares: Vec::new(),
            security_schemes: BTreeMap::new(),
            array_formats: ArrayFormats::default(),
            validate_responses: false,
            inject_ok_field: false,
            suppress_ok_field: None,
        }
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Registers an auth scheme.
    #[must_use]
    pub fn auth_scheme<A: Authenticator>(
        mut self,
        name: impl Into<String>,
        authenticator: A,
    ) -> Self {
        self.auth_schemes.insert(name.into(), Arc::new(authenticator));
        self
    }

    /// Appends a global middleware.
    #[must_use]
    pub fn global_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.global_middlewares.push(Arc::new(middleware));
        self
    }

    /// Registers an OpenAPI security scheme description.
    #[must_use]
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: Value) -> Self {
        self.security_schemes.insert(name.into(), scheme);
        self
    }

    /// Narrows the accepted query-array encodings.
    #[must_use]
    pub fn array_formats(mut self, formats: ArrayFormats) -> Self {
        self.array_formats = formats;
        self
    }

    /// Sets the default response-validation behavior.
    #[must_use]
    pub fn validate_responses(mut self, validate: bool) -> Self {
        self.validate_responses = validate;
        self
    }

    /// Enables automatic `ok`-field injection into response bodies.
    #[must_use]
    pub fn inject_ok_field(mut self, inject: bool) -> Self {
        self.inject_ok_field = inject;
        self
    }

    /// Suppresses `ok`-field injection for routes matching the predicate.
    #[must_use]
    pub fn suppress_ok_field<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RouteSpec) -> bool + Send + Sync + 'static,
    {
        self.suppress_ok_field = Some(Arc::new(predicate));
        self
    }

    /// Builds the setup. The [`NO_AUTH`] entry is always present.
    #[must_use]
    pub fn build(mut self) -> Arc<SetupParams> {
        self.auth_schemes
            .entry(NO_AUTH.to_string())
            .or_insert_with(|| Arc::new(NoAuth));

        Arc::new(SetupParams {
            api_name: self.api_name,
            version: self.version,
            base_url: self.base_url,
            description: self.description,
            auth_schemes: self.auth_schemes,
            global_middlewares: self.global_middlewares,
            security_schemes: self.security_schemes,
            array_formats: self.array_formats,
            validate_responses: self.validate_responses,
            inject_ok_field: self.inject_ok_field,
            suppress_ok_field: self.suppress_ok_field,
        })
    }
}
