//! Request dispatch.
//!
//! The [`Dispatcher`] resolves a request against the module registry, runs
//! the handler and turns every failure into a response:
//!
//! | Outcome | Response |
//! |---|---|
//! | no route, unsupported method, unknown host | not-found handler or `404 Not found` |
//! | `MissingParameter` / `InvalidParameterValue` | `400 Bad request` |
//! | any other error, or a panic | internal-error handler or `500 Internal server error` |
//!
//! Every request produces exactly one access log record and one request
//! metric, whichever path it took.

use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use conduit_core::{HandlerError, RequestContext, Response, SharedHandler};
use conduit_router::path::strip_prefix_ignore_case;
use conduit_router::MatchKind;
use futures_util::FutureExt;
use http::StatusCode;

use crate::access_log::AccessRecord;
use crate::module::ModuleRegistry;
use crate::sink::ResponseSink;

/// Dispatches requests to the handlers registered by site modules.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use conduit_core::{handler_fn, HandlerResult, RequestContext, Response};
/// use conduit_router::Route;
/// use conduit_server::{BasicModule, Dispatcher, ModuleRegistry};
///
/// async fn hello(_ctx: RequestContext) -> HandlerResult<Response> {
///     Ok(Response::text("hello"))
/// }
///
/// let registry = Arc::new(ModuleRegistry::new());
/// registry
///     .register_module(&BasicModule::new("site", "1").with_route(Route::get("/", handler_fn(hello))))
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(registry);
/// let response = tokio_test::block_on(dispatcher.dispatch(RequestContext::new("GET", "/")));
/// assert_eq!(response.body().as_ref(), b"hello");
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ModuleRegistry>,
    server_names: Vec<String>,
    not_found_handler: Option<SharedHandler>,
    internal_error_handler: Option<SharedHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher that accepts any host and uses stock bodies.
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            server_names: Vec::new(),
            not_found_handler: None,
            internal_error_handler: None,
        }
    }

    /// Restricts dispatch to requests for these host names. An empty list
    /// accepts every host.
    #[must_use]
    pub fn with_server_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Answers unmatched requests with `handler`.
    #[must_use]
    pub fn with_not_found_handler(mut self, handler: SharedHandler) -> Self {
        self.not_found_handler = Some(handler);
        self
    }

    /// Answers failed requests with `handler`.
    #[must_use]
    pub fn with_internal_error_handler(mut self, handler: SharedHandler) -> Self {
        self.internal_error_handler = Some(handler);
        self
    }

    /// The registry routes are resolved against.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Dispatches a request and returns the response.
    pub async fn dispatch(&self, ctx: RequestContext) -> Response {
        let start = Instant::now();
        let record = AccessRecord::from_context(&ctx);
        let method = ctx.method();

        let response = self.resolve(ctx).await;

        let status = response.status().as_u16();
        record.with_outcome(status, response.content_length()).emit();
        conduit_telemetry::metrics::record_request(method.as_str(), status, start.elapsed());
        response
    }

    /// Dispatches a request and writes the response through `sink`.
    ///
    /// Returns the number of body bytes the sink wrote.
    pub async fn dispatch_to<S>(&self, ctx: RequestContext, sink: &mut S) -> io::Result<u64>
    where
        S: ResponseSink + ?Sized,
    {
        let start = Instant::now();
        let record = AccessRecord::from_context(&ctx);
        let method = ctx.method();

        let response = self.resolve(ctx).await;
        let status = response.status().as_u16();
        let written = sink.send(response);

        record
            .with_outcome(status, *written.as_ref().unwrap_or(&0))
            .emit();
        conduit_telemetry::metrics::record_request(method.as_str(), status, start.elapsed());
        written
    }

    /// Dispatches an `http` request.
    pub async fn dispatch_http(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        self.dispatch(RequestContext::from_request(request))
            .await
            .into_http()
    }

    fn accepts_host(&self, ctx: &RequestContext) -> bool {
        if self.server_names.is_empty() {
            return true;
        }
        ctx.host().is_some_and(|host| {
            self.server_names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(host))
        })
    }

    async fn resolve(&self, ctx: RequestContext) -> Response {
        if !self.accepts_host(&ctx) {
            tracing::debug!(host = ?ctx.host(), "host not served");
            return self.not_found(ctx).await;
        }

        let Some(route) = self.registry.match_route(ctx.method(), ctx.path()) else {
            return self.not_found(ctx).await;
        };

        let path_info = match route.match_kind() {
            MatchKind::Exact => String::new(),
            MatchKind::StartsWith | MatchKind::RuntimeResolved => {
                strip_prefix_ignore_case(ctx.path(), route.path())
                    .unwrap_or("")
                    .to_string()
            }
        };
        let ctx = ctx.with_route_match(route.path(), path_info);
        let fallback_ctx = self.internal_error_handler.as_ref().map(|_| ctx.clone());

        match invoke(route.handler(), ctx).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) if err.is_bad_request() => {
                tracing::warn!(
                    route = %route,
                    parameter = err.parameter_name().unwrap_or_default(),
                    error = %err,
                    "bad request"
                );
                Response::text("Bad request").with_status(StatusCode::BAD_REQUEST)
            }
            Ok(Err(err)) => {
                tracing::error!(route = %route, error = ?err, "handler failed");
                self.internal_error(fallback_ctx).await
            }
            Err(panic) => {
                tracing::error!(
                    route = %route,
                    panic = %panic_message(panic.as_ref()),
                    "handler panicked"
                );
                self.internal_error(fallback_ctx).await
            }
        }
    }

    async fn not_found(&self, ctx: RequestContext) -> Response {
        match &self.not_found_handler {
            Some(handler) => fallback(handler, ctx, Response::not_found, "not-found").await,
            None => Response::not_found(),
        }
    }

    async fn internal_error(&self, ctx: Option<RequestContext>) -> Response {
        match (&self.internal_error_handler, ctx) {
            (Some(handler), Some(ctx)) => {
                fallback(handler, ctx, Response::internal_error, "internal-error").await
            }
            _ => Response::internal_error(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("server_names", &self.server_names)
            .field("not_found_handler", &self.not_found_handler.is_some())
            .field("internal_error_handler", &self.internal_error_handler.is_some())
            .finish()
    }
}

async fn invoke(
    handler: &SharedHandler,
    ctx: RequestContext,
) -> Result<Result<Response, HandlerError>, Box<dyn Any + Send>> {
    let handler = Arc::clone(handler);
    AssertUnwindSafe(async move { handler.handle(ctx).await })
        .catch_unwind()
        .await
}

/// Runs a collaborator handler, falling back to `stock` if it fails.
async fn fallback(
    handler: &SharedHandler,
    ctx: RequestContext,
    stock: fn() -> Response,
    which: &'static str,
) -> Response {
    match invoke(handler, ctx).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::error!(handler = which, error = ?err, "fallback handler failed");
            stock()
        }
        Err(panic) => {
            tracing::error!(
                handler = which,
                panic = %panic_message(panic.as_ref()),
                "fallback handler panicked"
            );
            stock()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
