//! Route table for Conduit.
//!
//! This crate stores routes per HTTP method and resolves incoming request
//! paths to them. It knows nothing about HTTP bodies or handlers: the
//! handler type is a generic parameter, so the server crate can attach
//! type-erased async handlers while tests attach plain strings.
//!
//! # Match kinds
//!
//! - **Exact**: the normalized request path equals the normalized route path.
//! - **Runtime resolved**: the path starts with the route's prefix and the
//!   route's [`RemainderFilter`] accepts what follows.
//! - **Starts with**: the path starts with the route's prefix. The longest
//!   prefix wins.
//!
//! Kinds are tried in that order. Normalization lower-cases the path and
//! drops a single trailing `/`.
//!
//! # Example
//!
//! ```rust
//! use conduit_router::{HttpMethod, Route, RouteTable};
//!
//! let table = RouteTable::new();
//! table.register("users (1.0)", Route::get("/users", "listUsers")).unwrap();
//! table.register("users (1.0)", Route::post("/users", "createUser")).unwrap();
//! table
//!     .register(
//!         "files (1.0)",
//!         Route::runtime_resolved(HttpMethod::Get, "/files/", "serveFile", |rest: &str| {
//!             rest.ends_with(".txt")
//!         }),
//!     )
//!     .unwrap();
//!
//! let route = table.match_route(HttpMethod::Get, "/Users/").unwrap();
//! assert_eq!(*route.handler(), "listUsers");
//!
//! assert!(table.match_route(HttpMethod::Get, "/files/notes.txt").is_some());
//! assert!(table.match_route(HttpMethod::Get, "/files/image.png").is_none());
//! ```

mod error;
mod method;
pub mod path;
mod route;
mod table;

pub use error::{RouteError, RouteResult};
pub use method::HttpMethod;
pub use route::{MatchKind, Registration, RemainderFilter, Route, RouteKind};
pub use table::RouteTable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteTable<String>>();
        assert_send_sync::<Route<String>>();
    }

    #[test]
    fn test_shared_table_across_threads() {
        let table = std::sync::Arc::new(RouteTable::new());
        table.register("m", Route::get("/ping", 1_u32)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                std::thread::spawn(move || {
                    table
                        .match_route(HttpMethod::Get, "/PING")
                        .map(|route| *route.handler())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }
}
