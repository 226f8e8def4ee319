//! # Conduit Core
//!
//! Core types and traits shared by Conduit handlers and the dispatcher.
//!
//! - [`RequestContext`] - Everything a handler may read about a request
//! - [`Response`] - A buffered response with status, headers and body
//! - [`Handler`] / [`RuntimeResolvedHandler`] - Handler traits
//! - [`HandlerError`] - Failure taxonomy the dispatcher classifies
//! - [`params`] - Typed parameter extraction helpers

#![doc(html_root_url = "https://docs.rs/conduit-core/0.1.0")]

mod context;
mod error;
mod handler;
pub mod headers;
pub mod params;
mod response;

pub use context::{RequestContext, RequestId};
pub use error::{HandlerError, HandlerResult};
pub use handler::{
    handler_fn, runtime_resolved_route, FnHandler, Handler, HandlerFuture, HandlerRoute,
    RuntimeResolvedHandler, SharedHandler,
};
pub use response::{RedirectKind, Response, SetCookie};
