//! Core middleware trait and types.
//!
//! A middleware transforms a handler into a handler: it receives the
//! mutable request context, the request, and a [`Next`] callback for the
//! rest of the chain. Beyond processing, each middleware *declares* the
//! context fields it contributes ([`Middleware::provides`]) and the fields
//! it expects an earlier middleware to have contributed
//! ([`Middleware::requires`]); the chain verifies those declarations once,
//! when it is built.
//!
//! # Example
//!
//! ```
//! use pylon_middleware::{BoxFuture, Middleware, Next, RequestContext};
//! use pylon_core::{Request, Response};
//!
//! struct TraceMiddleware;
//!
//! impl Middleware for TraceMiddleware {
//!     fn name(&self) -> &'static str {
//!         "trace"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             tracing::debug!(request_id = %ctx.request_id(), "request started");
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(status = %response.status(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::RequestContext;
use pylon_core::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The middleware contract.
///
/// # Invariants
///
/// - A middleware calls `next.run()` at most once; not calling it
///   short-circuits the chain and its own response stands
/// - `requires()` names only fields some earlier middleware `provides()` —
///   verified once at chain construction, never per request
pub trait Middleware: Send + Sync + 'static {
    /// The unique name of this middleware, used in logs and configuration
    /// errors.
    fn name(&self) -> &'static str;

    /// Context fields this middleware contributes to the request context.
    fn provides(&self) -> &'static [&'static str] {
        &[]
    }

    /// Context fields this middleware expects to already be present.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    /// Processes the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Callback to invoke the rest of the chain.
///
/// Consumed on use, so it can be called at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain - invoke the terminal handler.
    Handler(
        Box<dyn FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a>,
    ),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

/// A middleware defined by a function.
///
/// # Example
///
/// ```ignore
/// let timing = FnMiddleware::new("timing", |ctx, req, next| async move {
///     let response = next.run(ctx, req).await;
///     tracing::debug!(elapsed = ?ctx.elapsed(), "handled");
///     response
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    provides: &'static [&'static str],
    requires: &'static [&'static str],
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a function-based middleware with no context declarations.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self {
            name,
            provides: &[],
            requires: &[],
            func,
        }
    }

    /// Declares the context fields this middleware contributes.
    #[must_use]
    pub const fn provides(mut self, fields: &'static [&'static str]) -> Self {
        self.provides = fields;
        self
    }

    /// Declares the context fields this middleware depends on.
    #[must_use]
    pub const fn requires(mut self, fields: &'static [&'static str]) -> Self {
        self.requires = fields;
        self
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn provides(&self) -> &'static [&'static str] {
        self.provides
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}
