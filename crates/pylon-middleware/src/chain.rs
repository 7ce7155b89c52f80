//! Middleware chain composition.
//!
//! A [`Chain`] is an ordered list of middlewares plus a terminal handler
//! position. Construction performs the one-time dependency assertion: every
//! field a middleware [`requires`](crate::Middleware::requires) must have
//! been [`provided`](crate::Middleware::provides) by an earlier middleware
//! in the same chain, otherwise [`ConfigError::UnmetDependency`] names the
//! offender. Nothing is re-checked per request.
//!
//! Execution composes right-to-left: the terminal handler is the innermost
//! callable, and each middleware from last to first wraps the current
//! innermost, so declaration order equals execution order.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use pylon_core::{ConfigError, Request, Response};
use std::collections::HashSet;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered, dependency-checked middleware chain.
///
/// # Example
///
/// ```ignore
/// let chain = Chain::new(vec![auth, method_check, validation])?;
/// let response = chain.process(ctx, request, handler).await;
/// ```
pub struct Chain {
    stages: Vec<BoxedMiddleware>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Chain {
    /// Builds a chain, verifying the declared context-field dependencies.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnmetDependency`] when a middleware requires a field
    /// no earlier middleware provides.
    pub fn new(stages: Vec<BoxedMiddleware>) -> Result<Self, ConfigError> {
        let mut provided: HashSet<&'static str> = HashSet::new();

        for stage in &stages {
            for required in stage.requires() {
                if !provided.contains(required) {
                    return Err(ConfigError::UnmetDependency {
                        middleware: stage.name().to_string(),
                        field: (*required).to_string(),
                    });
                }
            }
            provided.extend(stage.provides().iter().copied());
        }

        Ok(Self { stages })
    }

    /// Processes a request through the chain, terminating in `handler`.
    pub async fn process<H>(
        &self,
        mut ctx: RequestContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Wraps the handler in the middleware stages, last to first.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);

        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
