//! Site modules and the registry that owns their routes.
//!
//! A site module is a named, versioned bundle of routes. Modules are
//! registered once at startup; each of their routes lands in the shared
//! route table under the module's display name, so a conflict can report
//! which module already owns a path.

use conduit_core::{HandlerRoute, SharedHandler};
use conduit_router::{HttpMethod, Route, RouteError, RouteTable};
use parking_lot::RwLock;
use thiserror::Error;

/// Result type alias using [`ModuleError`].
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Module registration failure.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A module with the same system name is already registered.
    #[error("module already registered: {0}")]
    AlreadyRegistered(String),

    /// One of the module's routes is owned by another registration.
    #[error("path {path} is already registered by {owner}")]
    PathAlreadyRegistered {
        /// The conflicting route path.
        path: String,
        /// Display name of the owning module.
        owner: String,
    },

    /// The route table rejected a route.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// A bundle of routes registered as a unit.
pub trait SiteModule: Send + Sync {
    /// Unique, case-insensitive name of the module.
    fn system_name(&self) -> &str;

    /// One-line description shown in diagnostics.
    fn short_description(&self) -> &str {
        ""
    }

    /// Monotonic version number.
    fn version_code(&self) -> u32;

    /// Human-readable version.
    fn version_name(&self) -> &str;

    /// Builds the module's routes.
    fn create_routes(&self) -> Vec<HandlerRoute>;
}

/// Name under which a module's routes are registered.
pub fn display_name(module: &dyn SiteModule) -> String {
    format!("{} ({})", module.system_name(), module.version_name())
}

/// Registered modules and the route table they populate.
///
/// # Example
///
/// ```rust
/// use conduit_core::{handler_fn, HandlerResult, RequestContext, Response};
/// use conduit_router::{HttpMethod, Route};
/// use conduit_server::{BasicModule, ModuleRegistry};
///
/// async fn ping(_ctx: RequestContext) -> HandlerResult<Response> {
///     Ok(Response::text("pong"))
/// }
///
/// let registry = ModuleRegistry::new();
/// let module = BasicModule::new("health", "1.0").with_route(Route::get("/ping", handler_fn(ping)));
/// registry.register_module(&module).unwrap();
///
/// assert!(registry.is_module_registered(&module));
/// assert!(registry.match_route(HttpMethod::Get, "/PING").is_some());
/// ```
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    table: RouteTable<SharedHandler>,
    modules: RwLock<Vec<String>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module and all of its routes.
    ///
    /// Registration is all or nothing: if any route is rejected, no route of
    /// the module is added and the module can be registered again once fixed.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::AlreadyRegistered`] for a duplicate system name
    /// - [`ModuleError::PathAlreadyRegistered`] if a route's key is taken
    /// - [`ModuleError::Route`] if the table rejects a route, including two
    ///   routes of the module sharing a key
    pub fn register_module(&self, module: &dyn SiteModule) -> ModuleResult<()> {
        let key = module.system_name().to_lowercase();
        let mut modules = self.modules.write();
        if modules.contains(&key) {
            return Err(ModuleError::AlreadyRegistered(
                module.system_name().to_string(),
            ));
        }

        let routes = module.create_routes();
        for route in &routes {
            if let Some(existing) = self.table.get_registration(route) {
                return Err(ModuleError::PathAlreadyRegistered {
                    path: route.path().to_string(),
                    owner: existing.module_name,
                });
            }
        }

        let name = display_name(module);
        let count = self.table.register_all(name.as_str(), routes)?;
        modules.push(key);

        tracing::info!(
            module = %name,
            routes = count,
            description = module.short_description(),
            "registered module"
        );
        Ok(())
    }

    /// Returns `true` if a module with the same system name is registered.
    pub fn is_module_registered(&self, module: &dyn SiteModule) -> bool {
        let key = module.system_name().to_lowercase();
        self.modules.read().contains(&key)
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.read().len()
    }

    /// Resolves a request to a route.
    pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<HandlerRoute> {
        self.table.match_route(method, path)
    }

    /// The underlying route table.
    pub const fn table(&self) -> &RouteTable<SharedHandler> {
        &self.table
    }
}

/// A module assembled from a name, a version and a list of routes.
#[derive(Debug, Clone)]
pub struct BasicModule {
    system_name: String,
    short_description: String,
    version_code: u32,
    version_name: String,
    routes: Vec<HandlerRoute>,
}

impl BasicModule {
    /// Creates a module with no routes.
    pub fn new(system_name: impl Into<String>, version_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            short_description: String::new(),
            version_code: 1,
            version_name: version_name.into(),
            routes: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.short_description = description.into();
        self
    }

    /// Sets the version code.
    #[must_use]
    pub const fn with_version_code(mut self, version_code: u32) -> Self {
        self.version_code = version_code;
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn with_route(mut self, route: Route<SharedHandler>) -> Self {
        self.routes.push(route);
        self
    }
}

impl SiteModule for BasicModule {
    fn system_name(&self) -> &str {
        &self.system_name
    }

    fn short_description(&self) -> &str {
        &self.short_description
    }

    fn version_code(&self) -> u32 {
        self.version_code
    }

    fn version_name(&self) -> &str {
        &self.version_name
    }

    fn create_routes(&self) -> Vec<HandlerRoute> {
        self.routes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{handler_fn, HandlerResult, RequestContext, Response};

    async fn ok(_ctx: RequestContext) -> HandlerResult<Response> {
        Ok(Response::text("ok"))
    }

    fn module(name: &str, paths: &[&str]) -> BasicModule {
        paths.iter().fold(BasicModule::new(name, "2.1"), |module, path| {
            module.with_route(Route::get(*path, handler_fn(ok)))
        })
    }

    #[test]
    fn test_register_module() {
        let registry = ModuleRegistry::new();
        registry
            .register_module(&module("shop", &["/cart", "/checkout"]))
            .unwrap();

        assert_eq!(registry.module_count(), 1);
        assert_eq!(registry.table().len(), 2);
        let registrations = registry.table().routes(HttpMethod::Get);
        assert!(registrations.iter().all(|r| r.module_name == "shop (2.1)"));
    }

    #[test]
    fn test_duplicate_module_name() {
        let registry = ModuleRegistry::new();
        registry.register_module(&module("Shop", &["/a"])).unwrap();

        let err = registry
            .register_module(&module("shop", &["/b"]))
            .unwrap_err();
        assert!(matches!(err, ModuleError::AlreadyRegistered(name) if name == "shop"));
        assert!(registry.match_route(HttpMethod::Get, "/b").is_none());
    }

    #[test]
    fn test_path_conflict_names_owner() {
        let registry = ModuleRegistry::new();
        registry.register_module(&module("shop", &["/cart"])).unwrap();

        let err = registry
            .register_module(&module("blog", &["/posts", "/Cart/"]))
            .unwrap_err();
        match err {
            ModuleError::PathAlreadyRegistered { path, owner } => {
                assert_eq!(path, "/Cart/");
                assert_eq!(owner, "shop (2.1)");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(registry.match_route(HttpMethod::Get, "/posts").is_none());
        assert!(!registry.is_module_registered(&module("blog", &[])));
    }

    #[test]
    fn test_table_rejection_surfaces() {
        let registry = ModuleRegistry::new();
        let bad = BasicModule::new("files", "1").with_route(Route::starts_with(
            HttpMethod::Get,
            "/files",
            handler_fn(ok),
        ));

        let err = registry.register_module(&bad).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Route(RouteError::BadPathFormat { .. })
        ));
    }

    #[test]
    fn test_duplicate_route_within_module() {
        let registry = ModuleRegistry::new();
        let err = registry
            .register_module(&module("m", &["/a", "/b", "/a"]))
            .unwrap_err();

        assert!(matches!(
            err,
            ModuleError::Route(RouteError::AlreadyRegistered { .. })
        ));
        assert!(registry.table().is_empty());
        assert!(!registry.is_module_registered(&module("m", &[])));

        registry.register_module(&module("m", &["/a", "/b"])).unwrap();
        assert_eq!(registry.table().len(), 2);
    }

    #[test]
    fn test_late_bad_route_leaves_nothing_behind() {
        let registry = ModuleRegistry::new();
        let bad = module("files", &["/index"]).with_route(Route::starts_with(
            HttpMethod::Get,
            "/files",
            handler_fn(ok),
        ));
        assert!(registry.register_module(&bad).is_err());
        assert!(registry.match_route(HttpMethod::Get, "/index").is_none());

        registry
            .register_module(&module("files", &["/index"]))
            .unwrap();
        assert!(registry.match_route(HttpMethod::Get, "/index").is_some());
    }

    #[test]
    fn test_module_metadata() {
        let module = BasicModule::new("docs", "3.0.1")
            .with_description("Documentation pages")
            .with_version_code(30);
        assert_eq!(module.short_description(), "Documentation pages");
        assert_eq!(module.version_code(), 30);
        assert_eq!(display_name(&module), "docs (3.0.1)");
    }
}
