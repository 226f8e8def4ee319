//! Handler traits for request processing.
//!
//! Routes store handlers as [`SharedHandler`], a type-erased
//! `Arc<dyn Handler>`, so one route table can hold handlers of different
//! concrete types.

use std::future::Future;
use std::sync::Arc;

use conduit_router::{HttpMethod, Route};
use futures_util::future::BoxFuture;

use crate::context::RequestContext;
use crate::error::HandlerResult;
use crate::response::Response;

/// The future returned by [`Handler::handle`].
pub type HandlerFuture = BoxFuture<'static, HandlerResult<Response>>;

/// A type-erased handler stored in routes.
pub type SharedHandler = Arc<dyn Handler>;

/// A route carrying a type-erased handler.
pub type HandlerRoute = Route<SharedHandler>;

/// Processes one request.
///
/// # Example
///
/// ```rust
/// use conduit_core::{Handler, HandlerFuture, RequestContext, Response};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn handle(&self, ctx: RequestContext) -> HandlerFuture {
///         let name = ctx.opt_from_query("name", "world").to_string();
///         Box::pin(async move { Ok(Response::text(format!("Hello, {name}!"))) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles a request and returns a response.
    ///
    /// # Errors
    ///
    /// Parameter errors become 400 responses; anything else becomes a 500
    /// response or is passed to the configured internal-error handler.
    fn handle(&self, ctx: RequestContext) -> HandlerFuture;
}

/// A handler whose routes decide at match time whether they apply.
///
/// Typical use is serving files: the handler is registered under a prefix
/// and accepts a path only if the file behind it exists.
pub trait RuntimeResolvedHandler: Handler {
    /// Returns `true` if this handler accepts the path remainder beyond its
    /// registered prefix.
    fn willing_to_handle(&self, remainder: &str) -> bool;
}

/// A function-based handler wrapper.
///
/// # Example
///
/// ```rust
/// use conduit_core::{FnHandler, HandlerResult, RequestContext, Response};
///
/// async fn pong(_ctx: RequestContext) -> HandlerResult<Response> {
///     Ok(Response::text("pong"))
/// }
///
/// let handler = FnHandler::new(pong);
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<Response>> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext) -> HandlerFuture {
        Box::pin((self.func)(ctx))
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wraps an async function as a [`SharedHandler`].
pub fn handler_fn<F, Fut>(func: F) -> SharedHandler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<Response>> + Send + 'static,
{
    Arc::new(FnHandler::new(func))
}

/// Builds a runtime-resolved route whose filter is the handler itself.
pub fn runtime_resolved_route<T>(
    method: HttpMethod,
    prefix: impl Into<String>,
    handler: Arc<T>,
) -> HandlerRoute
where
    T: RuntimeResolvedHandler,
{
    let filter = Arc::clone(&handler);
    let handler: SharedHandler = handler;
    Route::runtime_resolved(method, prefix, handler, move |remainder: &str| {
        filter.willing_to_handle(remainder)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlerError;
    use conduit_router::MatchKind;

    struct Files;

    impl Handler for Files {
        fn handle(&self, ctx: RequestContext) -> HandlerFuture {
            Box::pin(async move { Ok(Response::text(ctx.path_info().to_string())) })
        }
    }

    impl RuntimeResolvedHandler for Files {
        fn willing_to_handle(&self, remainder: &str) -> bool {
            remainder == "readme.txt"
        }
    }

    async fn echo_id(ctx: RequestContext) -> HandlerResult<Response> {
        let id = ctx
            .get_from_query("id")
            .ok_or_else(|| HandlerError::missing_parameter("id"))?;
        Ok(Response::text(id))
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = handler_fn(echo_id);

        let ok = handler
            .handle(RequestContext::new("GET", "/").with_query("id=9"))
            .await
            .unwrap();
        assert_eq!(ok.body().as_ref(), b"9");

        let err = handler
            .handle(RequestContext::new("GET", "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingParameter(name) if name == "id"));
    }

    #[tokio::test]
    async fn test_runtime_resolved_route() {
        let route = runtime_resolved_route(HttpMethod::Get, "/docs/", Arc::new(Files));
        assert_eq!(route.match_kind(), MatchKind::RuntimeResolved);
        assert!(route.is_willing_to_handle("readme.txt"));
        assert!(!route.is_willing_to_handle("other.txt"));

        let ctx = RequestContext::new("GET", "/docs/readme.txt").with_route_match("/docs/", "readme.txt");
        let response = route.handler().handle(ctx).await.unwrap();
        assert_eq!(response.body().as_ref(), b"readme.txt");
    }
}
