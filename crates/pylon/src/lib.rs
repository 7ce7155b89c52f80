//! # Pylon
//!
//! **Declarative validation and middleware layer for HTTP route handlers**
//!
//! Route handlers declare a [`RouteSpec`](middleware::RouteSpec) - allowed
//! methods, authentication requirement, body/query/response schemas - and
//! [`build_route`](middleware::build_route) composes authentication,
//! method checking, input validation, and response validation around the
//! handler. A companion generator walks built routes and emits an OpenAPI
//! document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pylon::prelude::*;
//! use serde_json::json;
//!
//! let setup = SetupParams::builder("widgets-api")
//!     .auth_scheme("auth_token", TokenAuth::new(secret))
//!     .validate_responses(true)
//!     .build();
//!
//! let spec = RouteSpec::builder()
//!     .methods([http::Method::DELETE])
//!     .auth_scheme("auth_token")
//!     .common_params(Schema::compile(json!({
//!         "type": "object",
//!         "required": ["id"],
//!         "properties": { "id": { "type": "string" } }
//!     }))?)
//!     .build();
//!
//! let route = build_route(&setup, spec, |ctx, _req| {
//!     let id = ctx.common_params().cloned();
//!     Box::pin(async move {
//!         // Your handler logic here
//!         Ok(Response::json(http::StatusCode::OK, &json!({})))
//!     })
//! })?;
//! ```
//!
//! ## Architecture
//!
//! Every built route runs a fixed chain:
//!
//! ```text
//! Request → globals → auth → method check → request validation
//!         → route middlewares → [response validation] → handler
//! ```

#![doc(html_root_url = "https://docs.rs/pylon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use pylon_core as core;

// Re-export schema handling
pub use pylon_schema as schema;

// Re-export the middleware and route layer
pub use pylon_middleware as middleware;

// Re-export documentation generation
pub use pylon_docs as docs;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use pylon::prelude::*;
/// ```
pub mod prelude {
    pub use pylon_core::{
        ApiError, ApiResult, ArrayFormat, ArrayFormats, ConfigError, ErrorKind, Identity,
        Request, RequestId, Response, ResponseExt,
    };

    pub use pylon_schema::{parse_query, Schema};

    pub use pylon_middleware::{
        build_route, Authenticator, BoxFuture, Chain, FnMiddleware, Middleware, Next,
        RequestContext, Route, RouteAuth, RouteSpec, SetupParams, NO_AUTH,
    };

    pub use pylon_docs::DocsBuilder;
}
