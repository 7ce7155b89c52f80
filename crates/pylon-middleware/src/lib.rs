//! # Pylon Middleware
//!
//! Middleware composition and the declarative route layer:
//!
//! - [`Middleware`] / [`Next`] - the middleware contract, with declared
//!   context-field contributions and dependencies
//! - [`Chain`] - ordered composition with a one-time dependency assertion
//!   at construction
//! - [`RequestContext`] - mutable per-request context threaded through the
//!   chain
//! - [`RouteSpec`] / [`SetupParams`] - declarative route and project
//!   configuration, immutable after construction
//! - [`build_route`] - composes auth, method checking, request validation,
//!   and response validation around a handler
//!
//! ## Chain order
//!
//! ```text
//! Request → globals → auth → method check → request validation
//!         → route middlewares → [response validation] → handler
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod context;
mod middleware;
mod route;
mod setup;
mod spec;
pub mod stages;

pub use chain::{BoxedMiddleware, Chain};
pub use context::{field, RequestContext};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use route::{build_route, Route, RouteHandler};
pub use setup::{Authenticator, NoAuth, OkFieldPredicate, SetupParams, SetupParamsBuilder, NO_AUTH};
pub use spec::{AuthFailureHandler, RouteAuth, RouteSpec, RouteSpecBuilder};
