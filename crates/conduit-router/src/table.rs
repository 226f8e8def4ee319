//! The route table.
//!
//! Routes are bucketed per method and per match kind. Exact and
//! runtime-resolved routes are keyed by normalized path; prefix routes are
//! kept in a list sorted by descending path length so the most specific
//! prefix is tried first.

use std::collections::HashSet;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{RouteError, RouteResult};
use crate::method::HttpMethod;
use crate::path::{ends_with_separator, matches_prefix, normalize_path};
use crate::route::{MatchKind, Registration, Route};

/// A registration plus the lower-cased path used when matching.
#[derive(Clone)]
struct Indexed<H> {
    match_path: String,
    registration: Registration<H>,
}

/// All routes registered for one method.
struct MethodRoutes<H> {
    exact: IndexMap<String, Indexed<H>>,
    runtime_resolved: IndexMap<String, Indexed<H>>,
    starts_with: Vec<Indexed<H>>,
}

impl<H> Default for MethodRoutes<H> {
    fn default() -> Self {
        Self {
            exact: IndexMap::new(),
            runtime_resolved: IndexMap::new(),
            starts_with: Vec::new(),
        }
    }
}

impl<H> MethodRoutes<H> {
    fn len(&self) -> usize {
        self.exact.len() + self.runtime_resolved.len() + self.starts_with.len()
    }

    fn check(&self, route: &Route<H>) -> RouteResult<()> {
        if route.match_kind() == MatchKind::StartsWith && !ends_with_separator(route.path()) {
            return Err(RouteError::bad_path_format(route.path()));
        }
        if self.find(route).is_some() {
            return Err(RouteError::already_registered(route.method(), route.path()));
        }
        Ok(())
    }

    /// Inserts a route that passed [`check`](Self::check).
    fn insert(&mut self, module_name: String, route: Route<H>) {
        let method = route.method();
        let kind = route.match_kind();
        let path = route.path().to_string();
        let key = key_of(&route);

        match kind {
            MatchKind::Exact => {
                let entry = Indexed {
                    match_path: key.clone(),
                    registration: Registration::new(module_name.clone(), route),
                };
                self.exact.insert(key, entry);
            }
            MatchKind::RuntimeResolved => {
                if !ends_with_separator(&path) {
                    warn!(
                        http.method = %method,
                        route = %path,
                        "runtime resolved route path does not end with '/'"
                    );
                }
                let entry = Indexed {
                    match_path: path.to_lowercase(),
                    registration: Registration::new(module_name.clone(), route),
                };
                self.runtime_resolved.insert(key, entry);
            }
            MatchKind::StartsWith => {
                self.starts_with.push(Indexed {
                    match_path: path.to_lowercase(),
                    registration: Registration::new(module_name.clone(), route),
                });
                self.starts_with
                    .sort_by(|a, b| b.match_path.len().cmp(&a.match_path.len()));
            }
        }

        info!(
            http.method = %method,
            route = %path,
            kind = ?kind,
            module = %module_name,
            "registered route"
        );
    }

    fn find(&self, route: &Route<H>) -> Option<&Indexed<H>> {
        match route.match_kind() {
            MatchKind::Exact => self.exact.get(&route.normalized_path()),
            MatchKind::RuntimeResolved => self.runtime_resolved.get(&route.normalized_path()),
            MatchKind::StartsWith => self
                .starts_with
                .iter()
                .find(|entry| entry.registration.route.path() == route.path()),
        }
    }
}

/// Per-method storage of registered routes.
///
/// The table is read-mostly: registration normally happens once at startup,
/// after which any number of threads may call [`RouteTable::match_route`]
/// concurrently.
///
/// # Example
///
/// ```rust
/// use conduit_router::{HttpMethod, Route, RouteTable};
///
/// let table = RouteTable::new();
/// table.register("site", Route::starts_with(HttpMethod::Get, "/", "fallback")).unwrap();
/// table.register("site", Route::starts_with(HttpMethod::Get, "/api/", "api")).unwrap();
/// table.register("site", Route::get("/api/status", "status")).unwrap();
///
/// let route = table.match_route(HttpMethod::Get, "/api/status/").unwrap();
/// assert_eq!(*route.handler(), "status");
///
/// let route = table.match_route(HttpMethod::Get, "/api/users").unwrap();
/// assert_eq!(*route.handler(), "api");
///
/// let route = table.match_route(HttpMethod::Get, "/elsewhere").unwrap();
/// assert_eq!(*route.handler(), "fallback");
/// ```
pub struct RouteTable<H> {
    get: RwLock<MethodRoutes<H>>,
    post: RwLock<MethodRoutes<H>>,
    put: RwLock<MethodRoutes<H>>,
    delete: RwLock<MethodRoutes<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.len())
            .finish()
    }
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            get: RwLock::new(MethodRoutes::default()),
            post: RwLock::new(MethodRoutes::default()),
            put: RwLock::new(MethodRoutes::default()),
            delete: RwLock::new(MethodRoutes::default()),
        }
    }

    fn slot(&self, method: HttpMethod) -> Option<&RwLock<MethodRoutes<H>>> {
        match method {
            HttpMethod::Get => Some(&self.get),
            HttpMethod::Post => Some(&self.post),
            HttpMethod::Put => Some(&self.put),
            HttpMethod::Delete => Some(&self.delete),
            HttpMethod::Unsupported => None,
        }
    }

    /// Registers a route on behalf of `module_name`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::BadPathFormat`] if a prefix route's path does not end
    ///   with `/`
    /// - [`RouteError::AlreadyRegistered`] if the route's key is taken
    /// - [`RouteError::UnsupportedMethod`] for [`HttpMethod::Unsupported`]
    pub fn register(&self, module_name: impl Into<String>, route: Route<H>) -> RouteResult<()> {
        let slot = self
            .slot(route.method())
            .ok_or_else(|| RouteError::unsupported_method(route.path()))?;
        let mut routes = slot.write();
        routes.check(&route)?;
        routes.insert(module_name.into(), route);
        Ok(())
    }

    /// Registers every route in `batch`, or none of them.
    ///
    /// Each route is checked against the table and against the batch's
    /// earlier routes before anything is inserted.
    ///
    /// # Errors
    ///
    /// The first error [`register`](Self::register) would have returned for
    /// a route of the batch, including a duplicate within the batch.
    pub fn register_all<I>(&self, module_name: impl Into<String>, batch: I) -> RouteResult<usize>
    where
        I: IntoIterator<Item = Route<H>>,
    {
        let batch: Vec<Route<H>> = batch.into_iter().collect();
        let module_name = module_name.into();

        // Always locked in the same order.
        let mut slots = [&self.get, &self.post, &self.put, &self.delete].map(|slot| slot.write());

        let mut staged = HashSet::with_capacity(batch.len());
        for route in &batch {
            let index = slot_index(route.method())
                .ok_or_else(|| RouteError::unsupported_method(route.path()))?;
            slots[index].check(route)?;
            if !staged.insert((index, route.match_kind(), key_of(route))) {
                return Err(RouteError::already_registered(route.method(), route.path()));
            }
        }

        let count = batch.len();
        for route in batch {
            if let Some(index) = slot_index(route.method()) {
                slots[index].insert(module_name.clone(), route);
            }
        }
        Ok(count)
    }

    /// Returns `true` if a route with the same key is registered.
    pub fn is_registered(&self, route: &Route<H>) -> bool {
        self.slot(route.method())
            .is_some_and(|slot| slot.read().find(route).is_some())
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        HttpMethod::SUPPORTED
            .iter()
            .filter_map(|method| self.slot(*method))
            .map(|slot| slot.read().len())
            .sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> RouteTable<H> {
    /// Returns the registration holding the same key as `route`.
    pub fn get_registration(&self, route: &Route<H>) -> Option<Registration<H>> {
        let slot = self.slot(route.method())?;
        let routes = slot.read();
        routes.find(route).map(|entry| entry.registration.clone())
    }

    /// Resolves a request to a route.
    ///
    /// Exact routes win, then runtime-resolved routes whose filter accepts
    /// the remainder, then prefix routes from the longest prefix down.
    pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<Route<H>> {
        let slot = self.slot(method)?;
        let normalized = normalize_path(path);
        let routes = slot.read();

        if let Some(entry) = routes.exact.get(&normalized) {
            return Some(entry.registration.route.clone());
        }

        for entry in routes.runtime_resolved.values() {
            if let Some(remainder) = normalized.strip_prefix(entry.match_path.as_str()) {
                if entry.registration.route.is_willing_to_handle(remainder) {
                    return Some(entry.registration.route.clone());
                }
            }
        }

        routes
            .starts_with
            .iter()
            .find(|entry| matches_prefix(&normalized, &entry.match_path))
            .map(|entry| entry.registration.route.clone())
    }

    /// Lists the registrations for `method`.
    ///
    /// Exact routes come first, then runtime-resolved routes, then prefix
    /// routes in match order.
    pub fn routes(&self, method: HttpMethod) -> Vec<Registration<H>> {
        let Some(slot) = self.slot(method) else {
            return Vec::new();
        };
        let routes = slot.read();
        routes
            .exact
            .values()
            .chain(routes.runtime_resolved.values())
            .chain(routes.starts_with.iter())
            .map(|entry| entry.registration.clone())
            .collect()
    }
}

/// Uniqueness key within a method and match kind: the normalized path,
/// or the literal path for prefix routes.
fn key_of<H>(route: &Route<H>) -> String {
    match route.match_kind() {
        MatchKind::StartsWith => route.path().to_string(),
        MatchKind::Exact | MatchKind::RuntimeResolved => route.normalized_path(),
    }
}

const fn slot_index(method: HttpMethod) -> Option<usize> {
    match method {
        HttpMethod::Get => Some(0),
        HttpMethod::Post => Some(1),
        HttpMethod::Put => Some(2),
        HttpMethod::Delete => Some(3),
        HttpMethod::Unsupported => None,
    }
}
