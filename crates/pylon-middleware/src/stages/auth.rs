//! Authentication stage.
//!
//! Tries the route's configured auth schemes in declared order. The first
//! success contributes the `identity` context field and the chain proceeds.
//! When every scheme fails, the individual failures are collected and
//! either handed to the route's custom aggregation handler or reported as a
//! single `unauthorized` failure stating how many schemes failed.

use crate::context::{field, RequestContext};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::setup::Authenticator;
use crate::spec::AuthFailureHandler;
use pylon_core::{ApiError, Request, Response, ResponseExt};
use serde_json::json;
use std::sync::Arc;

/// Middleware resolving the caller identity.
pub struct AuthStage {
    /// The route's schemes, resolved against the setup map at build time.
    authenticators: Vec<(String, Arc<dyn Authenticator>)>,
    on_failure: Option<AuthFailureHandler>,
}

impl AuthStage {
    /// Creates the stage from the route's resolved authenticators.
    #[must_use]
    pub fn new(
        authenticators: Vec<(String, Arc<dyn Authenticator>)>,
        on_failure: Option<AuthFailureHandler>,
    ) -> Self {
        Self {
            authenticators,
            on_failure,
        }
    }

    fn aggregate_failures(&self, mut failures: Vec<ApiError>) -> ApiError {
        if let Some(handler) = &self.on_failure {
            return handler(&failures);
        }
        if failures.len() == 1 {
            return failures.swap_remove(0);
        }
        let count = failures.len();
        ApiError::unauthorized(format!(
            "All {count} configured authentication methods failed"
        ))
        .with_data(json!({ "failed_methods": count }))
    }
}

impl Middleware for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn provides(&self) -> &'static [&'static str] {
        &[field::IDENTITY]
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut failures = Vec::new();

            for (scheme, authenticator) in &self.authenticators {
                match authenticator.authenticate(&request).await {
                    Ok(identity) => {
                        tracing::debug!(scheme = %scheme, "authentication succeeded");
                        ctx.set_identity(identity);
                        return next.run(ctx, request).await;
                    }
                    Err(error) => {
                        tracing::debug!(scheme = %scheme, error = %error, "authentication failed");
                        failures.push(error);
                    }
                }
            }

            let error = self.aggregate_failures(failures);
            tracing::warn!(request_id = %ctx.request_id(), error = %error, "request unauthorized");
            Response::from_error(&error)
        })
    }
}
