//! End-to-end dispatch through modules, the route table and the sinks.

use std::sync::Arc;

use bytes::Bytes;
use conduit_core::{
    handler_fn, runtime_resolved_route, Handler, HandlerError, HandlerFuture, HandlerResult,
    RequestContext, Response, RuntimeResolvedHandler,
};
use conduit_router::{HttpMethod, Route};
use conduit_server::{BasicModule, BufferedSink, Dispatcher, ModuleRegistry, ResponseSink};
use http::{HeaderValue, StatusCode};

async fn route_name(ctx: RequestContext) -> HandlerResult<Response> {
    Ok(Response::text(ctx.route_path().to_string()))
}

async fn panics(_ctx: RequestContext) -> HandlerResult<Response> {
    panic!("handler bug");
}

async fn fails(_ctx: RequestContext) -> HandlerResult<Response> {
    Err(anyhow::anyhow!("connection reset").into())
}

async fn custom_not_found(ctx: RequestContext) -> HandlerResult<Response> {
    Ok(Response::html(format!("<h1>No page at {}</h1>", ctx.path())).with_status(StatusCode::NOT_FOUND))
}

async fn custom_error(ctx: RequestContext) -> HandlerResult<Response> {
    Ok(Response::text(format!("sorry, {} failed", ctx.route_path()))
        .with_status(StatusCode::INTERNAL_SERVER_ERROR))
}

async fn broken_collaborator(_ctx: RequestContext) -> HandlerResult<Response> {
    Err(HandlerError::internal("template missing"))
}

struct Downloads;

impl Handler for Downloads {
    fn handle(&self, ctx: RequestContext) -> HandlerFuture {
        Box::pin(async move { Ok(Response::text(format!("file:{}", ctx.path_info()))) })
    }
}

impl RuntimeResolvedHandler for Downloads {
    fn willing_to_handle(&self, remainder: &str) -> bool {
        remainder.ends_with(".zip")
    }
}

fn site() -> Arc<ModuleRegistry> {
    let registry = Arc::new(ModuleRegistry::new());
    let module = BasicModule::new("site", "1.0")
        .with_route(Route::starts_with(HttpMethod::Get, "/", handler_fn(route_name)))
        .with_route(Route::starts_with(HttpMethod::Get, "/presni/", handler_fn(route_name)))
        .with_route(Route::starts_with(
            HttpMethod::Get,
            "/presni/chudesni/",
            handler_fn(route_name),
        ))
        .with_route(Route::starts_with(HttpMethod::Get, "/test/", handler_fn(route_name)))
        .with_route(Route::get("/presni/chudesni/exact", handler_fn(route_name)))
        .with_route(runtime_resolved_route(
            HttpMethod::Get,
            "/presni/files/",
            Arc::new(Downloads),
        ))
        .with_route(Route::get("/panic", handler_fn(panics)))
        .with_route(Route::post("/fail", handler_fn(fails)));
    registry.register_module(&module).unwrap();
    registry
}

async fn body(dispatcher: &Dispatcher, method: &str, path: &str) -> String {
    let response = dispatcher.dispatch(RequestContext::new(method, path)).await;
    String::from_utf8(response.body().to_vec()).unwrap()
}

#[tokio::test]
async fn test_longest_prefix_wins() {
    let dispatcher = Dispatcher::new(site());

    assert_eq!(body(&dispatcher, "GET", "/presni/chudesni/x").await, "/presni/chudesni/");
    assert_eq!(body(&dispatcher, "GET", "/presni/other").await, "/presni/");
    assert_eq!(body(&dispatcher, "GET", "/unrelated").await, "/");
}

#[tokio::test]
async fn test_exact_beats_prefix() {
    let dispatcher = Dispatcher::new(site());
    assert_eq!(
        body(&dispatcher, "GET", "/Presni/Chudesni/Exact/").await,
        "/presni/chudesni/exact"
    );
}

#[tokio::test]
async fn test_runtime_resolved_before_prefix() {
    let dispatcher = Dispatcher::new(site());

    assert_eq!(body(&dispatcher, "GET", "/presni/files/Setup.zip").await, "file:Setup.zip");
    assert_eq!(body(&dispatcher, "GET", "/presni/files/readme.txt").await, "/presni/");
}

#[tokio::test]
async fn test_method_is_part_of_the_key() {
    let dispatcher = Dispatcher::new(site());

    let response = dispatcher.dispatch(RequestContext::new("DELETE", "/test/x")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = dispatcher.dispatch(RequestContext::new("GET", "/fail")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failures_become_500() {
    let dispatcher = Dispatcher::new(site());

    let panicked = dispatcher.dispatch(RequestContext::new("GET", "/panic")).await;
    assert_eq!(panicked.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(panicked.body().as_ref(), b"500 Internal server error");

    let failed = dispatcher.dispatch(RequestContext::new("POST", "/fail")).await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_custom_collaborators() {
    let dispatcher = Dispatcher::new(site())
        .with_server_names(["example.com"])
        .with_not_found_handler(handler_fn(custom_not_found))
        .with_internal_error_handler(handler_fn(custom_error));

    let foreign = dispatcher
        .dispatch(RequestContext::new("GET", "/test/").with_host("evil.test"))
        .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(foreign.body().as_ref(), b"<h1>No page at /test/</h1>");

    let failed = dispatcher
        .dispatch(
            RequestContext::new("POST", "/fail")
                .with_header(http::header::HOST, HeaderValue::from_static("Example.com:8080")),
        )
        .await;
    assert_eq!(failed.body().as_ref(), b"sorry, /fail failed");
}

#[tokio::test]
async fn test_failing_collaborator_falls_back_to_stock_body() {
    let registry = Arc::new(ModuleRegistry::new());
    let dispatcher = Dispatcher::new(registry)
        .with_not_found_handler(handler_fn(broken_collaborator))
        .with_internal_error_handler(handler_fn(broken_collaborator));

    let response = dispatcher.dispatch(RequestContext::new("GET", "/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body().as_ref(), b"404 Not found");
}

#[tokio::test]
async fn test_dispatch_to_sink() {
    let dispatcher = Dispatcher::new(site());
    let mut sink = BufferedSink::new();

    let written = dispatcher
        .dispatch_to(RequestContext::new("GET", "/test/a"), &mut sink)
        .await
        .unwrap();
    assert_eq!(written, 6);

    let written = dispatcher
        .dispatch_to(RequestContext::new("PUT", "/anything"), &mut sink)
        .await
        .unwrap();
    assert_eq!(written, 13);

    let statuses: Vec<_> = sink.responses().iter().map(Response::status).collect();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::NOT_FOUND]);
}

struct ClosedSink;

impl ResponseSink for ClosedSink {
    fn send(&mut self, _response: Response) -> std::io::Result<u64> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client went away"))
    }
}

#[tokio::test]
async fn test_sink_errors_are_returned() {
    let dispatcher = Dispatcher::new(site());
    let err = dispatcher
        .dispatch_to(RequestContext::new("GET", "/"), &mut ClosedSink)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[tokio::test]
async fn test_dispatch_http() {
    let dispatcher = Dispatcher::new(site());
    let request = http::Request::builder()
        .method("GET")
        .uri("http://example.com/presni/chudesni/page?x=1")
        .body(Bytes::new())
        .unwrap();

    let response = dispatcher.dispatch_http(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"/presni/chudesni/");
}
