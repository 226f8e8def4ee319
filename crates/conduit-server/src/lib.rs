//! # Conduit Server
//!
//! Request dispatch for Conduit: site modules register their routes in a
//! shared [`ModuleRegistry`], and a [`Dispatcher`] resolves each request,
//! runs its handler and classifies failures into responses.
//!
//! - [`Dispatcher`] - Route resolution, failure classification, access log
//! - [`ModuleRegistry`] / [`SiteModule`] - Module and route registration
//! - [`ResponseSink`] - Transport boundary for finished responses
//! - [`AccessRecord`] - One access log line per request
//!
//! The transport adapter that turns a socket into a [`conduit_core::RequestContext`]
//! and a sink is outside this crate.

#![doc(html_root_url = "https://docs.rs/conduit-server/0.1.0")]

pub mod access_log;
mod dispatcher;
mod module;
mod sink;

pub use access_log::AccessRecord;
pub use dispatcher::Dispatcher;
pub use module::{
    display_name, BasicModule, ModuleError, ModuleRegistry, ModuleResult, SiteModule,
};
pub use sink::{BufferedSink, ResponseSink, WriterSink};
