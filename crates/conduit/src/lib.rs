//! # Conduit
//!
//! Building blocks for a module-based HTTP application server:
//!
//! - **Routing** - exact, prefix and runtime-resolved routes keyed by method,
//!   case-insensitive, longest prefix first ([`router`])
//! - **Dispatch** - site modules, a dispatcher that turns every failure into
//!   a response, and a Common Log Format access log ([`server`], [`core`])
//! - **Transactions** - retry on serialization failures and deadlocks with
//!   isolation control and guaranteed connection cleanup ([`db`])
//! - **Async tasks** - background work polled by id and token, expired by TTL
//!   ([`tasks`])
//! - **Telemetry and configuration** - `tracing` logs, Prometheus metrics and
//!   layered TOML/JSON/env configuration ([`telemetry`], [`config`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use conduit::prelude::*;
//!
//! async fn hello(ctx: RequestContext) -> HandlerResult<Response> {
//!     let name = ctx.get_from_query("name").unwrap_or("world");
//!     Ok(Response::text(format!("hello, {name}")))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("CONDUIT").load()?;
//!     conduit::telemetry::init_telemetry(config.telemetry_config())?;
//!
//!     let registry = Arc::new(ModuleRegistry::new());
//!     registry.register_module(
//!         &BasicModule::new("site", "1.0").with_route(Route::get("/hello", handler_fn(hello))),
//!     )?;
//!
//!     let dispatcher = Dispatcher::new(registry).with_server_names(config.server.server_names);
//!     let response = dispatcher.dispatch(RequestContext::new("GET", "/hello")).await;
//!     assert_eq!(response.status().as_u16(), 200);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/conduit/0.1.0")]

// Re-export request and response types
pub use conduit_core as core;

// Re-export route table types
pub use conduit_router as router;

// Re-export dispatch types
pub use conduit_server as server;

// Re-export transaction types
pub use conduit_db as db;

// Re-export async task types
pub use conduit_tasks as tasks;

// Re-export logging and metrics
pub use conduit_telemetry as telemetry;

// Re-export configuration
pub use conduit_config as config;

/// Prelude module for convenient imports.
///
/// ```rust
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use conduit_core::{
        handler_fn, runtime_resolved_route, Handler, HandlerError, HandlerResult, HandlerRoute,
        RequestContext, Response, RuntimeResolvedHandler, SharedHandler,
    };

    pub use conduit_router::{HttpMethod, MatchKind, Route, RouteError, RouteTable};

    pub use conduit_server::{
        BasicModule, BufferedSink, Dispatcher, ModuleError, ModuleRegistry, ResponseSink,
        SiteModule,
    };

    pub use conduit_db::{
        run_in_transaction, run_with_retry, CancelSignal, DbError, DbResult, IsolationLevel,
        RetryPolicy, TransactionRetryExecutor, TransactionalConnection,
    };

    pub use conduit_tasks::{
        AsyncTaskData, AsyncTaskManager, AsyncTaskManagerConfig, AsyncTaskOutcome,
        MaintenanceSchedule, TaskError, TaskSpawner, TaskState,
    };

    pub use conduit_config::{ConduitConfig, ConfigLoader};
}
