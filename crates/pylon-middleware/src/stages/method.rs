//! Method-check stage.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use http::Method;
use pylon_core::{ApiError, Request, Response, ResponseExt};

/// Middleware rejecting verbs outside the route's allowed set with 405.
#[derive(Debug, Clone)]
pub struct MethodCheckStage {
    allowed: Vec<Method>,
}

impl MethodCheckStage {
    /// Creates the stage from the route's allowed methods.
    #[must_use]
    pub fn new(allowed: Vec<Method>) -> Self {
        Self { allowed }
    }
}

impl Middleware for MethodCheckStage {
    fn name(&self) -> &'static str {
        "method_check"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !self.allowed.contains(request.method()) {
                let error = ApiError::method_not_allowed(format!(
                    "Method {} not allowed",
                    request.method()
                ));
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    method = %request.method(),
                    "method not allowed"
                );
                return Response::from_error(&error);
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn request(method: Method) -> Request {
        http::Request::builder()
            .method(method)
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler(
    ) -> impl FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send {
        |_ctx, _req| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        }
    }

    #[tokio::test]
    async fn allowed_method_passes() {
        let stage = MethodCheckStage::new(vec![Method::DELETE]);
        let response = stage
            .process(
                &mut RequestContext::new(),
                request(Method::DELETE),
                Next::handler(ok_handler()),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn disallowed_method_is_405() {
        let stage = MethodCheckStage::new(vec![Method::DELETE]);
        let response = stage
            .process(
                &mut RequestContext::new(),
                request(Method::GET),
                Next::handler(ok_handler()),
            )
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
