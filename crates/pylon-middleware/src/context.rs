//! Per-request context.
//!
//! The [`RequestContext`] flows mutably through the middleware chain. Each
//! stage enriches it: the auth stage contributes the caller identity, the
//! request-validation stage attaches the parsed body/query/common-params
//! values, and route middlewares may stash arbitrary typed extensions.

use pylon_core::{Identity, RequestId};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Well-known context field names used in middleware dependency
/// declarations.
pub mod field {
    /// Contributed by the auth stage.
    pub const IDENTITY: &str = "identity";
    /// Contributed by the request-validation stage when a body schema is
    /// declared.
    pub const BODY: &str = "body";
    /// Contributed by the request-validation stage when a query schema is
    /// declared.
    pub const QUERY: &str = "query";
    /// Contributed by the request-validation stage when a common-params
    /// schema is declared.
    pub const COMMON_PARAMS: &str = "common_params";
}

/// Context that flows through the middleware chain for one request.
///
/// # Example
///
/// ```
/// use pylon_middleware::RequestContext;
/// use pylon_core::Identity;
///
/// let mut ctx = RequestContext::new();
/// assert!(ctx.identity().is_anonymous());
///
/// ctx.set_identity(Identity::User {
///     user_id: "u-1".to_string(),
///     roles: vec![],
/// });
/// assert_eq!(ctx.identity().user_id(), Some("u-1"));
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    identity: Identity,
    body: Option<Value>,
    query: Option<Value>,
    common_params: Option<Value>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a fresh context with a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            identity: Identity::Anonymous,
            body: None,
            query: None,
            common_params: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Sets the caller identity. Called by the auth stage.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    /// Returns the validated request body, if a body schema was declared.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Attaches the validated request body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Returns the validated query parameters.
    #[must_use]
    pub fn query(&self) -> Option<&Value> {
        self.query.as_ref()
    }

    /// Attaches the validated query parameters.
    pub fn set_query(&mut self, query: Value) {
        self.query = Some(query);
    }

    /// Returns the validated common params (query and body merged).
    #[must_use]
    pub fn common_params(&self) -> Option<&Value> {
        self.common_params.as_ref()
    }

    /// Attaches the validated common params.
    pub fn set_common_params(&mut self, params: Value) {
        self.common_params = Some(params);
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// Extensions let middleware pass arbitrary data to later middleware
    /// or the handler.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_context_is_anonymous_and_unparsed() {
        let ctx = RequestContext::new();
        assert!(ctx.identity().is_anonymous());
        assert!(ctx.body().is_none());
        assert!(ctx.query().is_none());
        assert!(ctx.common_params().is_none());
    }

    #[test]
    fn parsed_values_round_trip() {
        let mut ctx = RequestContext::new();
        ctx.set_body(json!({ "name": "a" }));
        ctx.set_query(json!({ "limit": "10" }));
        ctx.set_common_params(json!({ "id": "x" }));

        assert_eq!(ctx.body(), Some(&json!({ "name": "a" })));
        assert_eq!(ctx.query(), Some(&json!({ "limit": "10" })));
        assert_eq!(ctx.common_params(), Some(&json!({ "id": "x" })));
    }

    #[test]
    fn extensions_round_trip() {
        #[derive(Debug, PartialEq)]
        struct Marker(u32);

        let mut ctx = RequestContext::new();
        assert!(ctx.get_extension::<Marker>().is_none());

        ctx.set_extension(Marker(7));
        assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));

        assert_eq!(ctx.remove_extension::<Marker>(), Some(Marker(7)));
        assert!(ctx.get_extension::<Marker>().is_none());
    }
}
