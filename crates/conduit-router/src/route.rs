//! Route values and registrations.

use std::fmt;
use std::sync::Arc;

use crate::method::HttpMethod;
use crate::path::normalize_path;

/// Decides whether a runtime-resolved route accepts the rest of a path.
///
/// The argument is the normalized request path with the registered prefix
/// removed, e.g. `css/site.css` for `/static/css/site.css` under `/static/`.
/// Any `Fn(&str) -> bool` closure is a filter.
pub trait RemainderFilter: Send + Sync {
    /// Returns `true` if the route is willing to handle `remainder`.
    fn willing_to_handle(&self, remainder: &str) -> bool;
}

impl<F> RemainderFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn willing_to_handle(&self, remainder: &str) -> bool {
        self(remainder)
    }
}

/// Strategy used to decide whether a path matches a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// The normalized path must equal the normalized route path.
    Exact,
    /// The path must start with the route path.
    StartsWith,
    /// The path must start with the route path and the route's filter must
    /// accept the remainder.
    RuntimeResolved,
}

/// How a route matches, with the data each strategy needs.
#[derive(Clone)]
pub enum RouteKind {
    /// See [`MatchKind::Exact`].
    Exact,
    /// See [`MatchKind::StartsWith`].
    StartsWith,
    /// See [`MatchKind::RuntimeResolved`].
    RuntimeResolved(Arc<dyn RemainderFilter>),
}

impl RouteKind {
    /// Returns the discriminant without the attached data.
    #[must_use]
    pub const fn match_kind(&self) -> MatchKind {
        match self {
            Self::Exact => MatchKind::Exact,
            Self::StartsWith => MatchKind::StartsWith,
            Self::RuntimeResolved(_) => MatchKind::RuntimeResolved,
        }
    }
}

impl fmt::Debug for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.match_kind(), f)
    }
}

/// An immutable `(method, path, match kind, handler)` tuple.
///
/// The handler type is opaque to the router; the server crate stores
/// type-erased async handlers here.
///
/// # Example
///
/// ```rust
/// use conduit_router::{HttpMethod, MatchKind, Route};
///
/// let route = Route::exact(HttpMethod::Get, "/users", "listUsers");
/// assert_eq!(route.match_kind(), MatchKind::Exact);
/// assert_eq!(route.normalized_path(), "/users");
///
/// let files = Route::runtime_resolved(HttpMethod::Get, "/files/", "serveFile", |rest: &str| {
///     rest.ends_with(".txt")
/// });
/// assert!(files.is_willing_to_handle("notes.txt"));
/// ```
#[derive(Clone)]
pub struct Route<H> {
    method: HttpMethod,
    path: String,
    kind: RouteKind,
    handler: H,
}

impl<H> Route<H> {
    /// Creates a route with an explicit kind.
    pub fn new(method: HttpMethod, path: impl Into<String>, kind: RouteKind, handler: H) -> Self {
        Self {
            method,
            path: path.into(),
            kind,
            handler,
        }
    }

    /// Creates an exact-match route.
    pub fn exact(method: HttpMethod, path: impl Into<String>, handler: H) -> Self {
        Self::new(method, path, RouteKind::Exact, handler)
    }

    /// Creates a prefix route. The path must end with `/` to be registrable.
    pub fn starts_with(method: HttpMethod, path: impl Into<String>, handler: H) -> Self {
        Self::new(method, path, RouteKind::StartsWith, handler)
    }

    /// Creates a runtime-resolved route guarded by `filter`.
    pub fn runtime_resolved<F>(
        method: HttpMethod,
        prefix: impl Into<String>,
        handler: H,
        filter: F,
    ) -> Self
    where
        F: RemainderFilter + 'static,
    {
        Self::new(
            method,
            prefix,
            RouteKind::RuntimeResolved(Arc::new(filter)),
            handler,
        )
    }

    /// Shorthand for an exact GET route.
    pub fn get(path: impl Into<String>, handler: H) -> Self {
        Self::exact(HttpMethod::Get, path, handler)
    }

    /// Shorthand for an exact POST route.
    pub fn post(path: impl Into<String>, handler: H) -> Self {
        Self::exact(HttpMethod::Post, path, handler)
    }

    /// Shorthand for an exact PUT route.
    pub fn put(path: impl Into<String>, handler: H) -> Self {
        Self::exact(HttpMethod::Put, path, handler)
    }

    /// Shorthand for an exact DELETE route.
    pub fn delete(path: impl Into<String>, handler: H) -> Self {
        Self::exact(HttpMethod::Delete, path, handler)
    }

    /// The route's HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The path as registered.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path after [`normalize_path`].
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// The route's match kind.
    pub fn match_kind(&self) -> MatchKind {
        self.kind.match_kind()
    }

    /// The route's kind with its attached data.
    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    /// The handler attached to this route.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Asks the route's filter about `remainder`.
    ///
    /// Exact and prefix routes accept every remainder.
    pub fn is_willing_to_handle(&self, remainder: &str) -> bool {
        match &self.kind {
            RouteKind::RuntimeResolved(filter) => filter.willing_to_handle(remainder),
            RouteKind::Exact | RouteKind::StartsWith => true,
        }
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<H> fmt::Display for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A route together with the module that registered it.
#[derive(Clone)]
pub struct Registration<H> {
    /// Name of the owning module.
    pub module_name: String,
    /// The registered route.
    pub route: Route<H>,
}

impl<H> Registration<H> {
    /// Creates a registration.
    pub fn new(module_name: impl Into<String>, route: Route<H>) -> Self {
        Self {
            module_name: module_name.into(),
            route,
        }
    }
}

impl<H> fmt::Debug for Registration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("module_name", &self.module_name)
            .field("route", &self.route)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_constructors() {
        let route = Route::get("/a", ());
        assert_eq!(route.method(), HttpMethod::Get);
        assert_eq!(route.match_kind(), MatchKind::Exact);

        let route = Route::starts_with(HttpMethod::Post, "/b/", ());
        assert_eq!(route.match_kind(), MatchKind::StartsWith);

        let route = Route::delete("/c", ());
        assert_eq!(route.method(), HttpMethod::Delete);
    }

    #[test]
    fn test_runtime_resolved_filter() {
        let route = Route::runtime_resolved(HttpMethod::Get, "/files/", (), |rest: &str| {
            !rest.is_empty()
        });
        assert_eq!(route.match_kind(), MatchKind::RuntimeResolved);
        assert!(route.is_willing_to_handle("a.txt"));
        assert!(!route.is_willing_to_handle(""));
    }

    #[test]
    fn test_exact_accepts_any_remainder() {
        let route = Route::put("/x", ());
        assert!(route.is_willing_to_handle("whatever"));
    }

    #[test]
    fn test_display_and_debug() {
        let route = Route::post("/Orders/", 7_u8);
        assert_eq!(route.to_string(), "POST /Orders/");
        assert_eq!(route.normalized_path(), "/orders");
        assert!(format!("{route:?}").contains("Exact"));
    }
}
