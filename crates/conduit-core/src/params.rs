//! Typed parameter extraction helpers.
//!
//! Every helper maps an absent parameter to
//! [`HandlerError::MissingParameter`] and an unparsable one to
//! [`HandlerError::InvalidParameterValue`], so handlers can propagate with
//! `?` and let the dispatcher answer 400.
//!
//! # Example
//!
//! ```rust
//! use conduit_core::{params, RequestContext};
//!
//! let ctx = RequestContext::new("GET", "/items").with_query("page=2&size=x");
//!
//! assert_eq!(params::extract_i32_from_query(&ctx, "page").unwrap(), 2);
//! assert!(params::extract_i32_from_query(&ctx, "size").is_err());
//! assert_eq!(params::opt_i32_from_query(&ctx, "limit").unwrap(), None);
//! ```

use std::str::FromStr;

use crate::context::RequestContext;
use crate::error::{HandlerError, HandlerResult};

/// Extracts a required `i32` from the query string.
pub fn extract_i32_from_query(ctx: &RequestContext, name: &str) -> HandlerResult<i32> {
    required(name, ctx.get_from_query(name))
}

/// Extracts a required `i32` from the form body.
pub fn extract_i32_from_post(ctx: &RequestContext, name: &str) -> HandlerResult<i32> {
    required(name, ctx.get_from_post(name))
}

/// Extracts a required `i64` from the query string.
pub fn extract_i64_from_query(ctx: &RequestContext, name: &str) -> HandlerResult<i64> {
    required(name, ctx.get_from_query(name))
}

/// Extracts a required `i64` from the form body.
pub fn extract_i64_from_post(ctx: &RequestContext, name: &str) -> HandlerResult<i64> {
    required(name, ctx.get_from_post(name))
}

/// Extracts an optional `i32` from the query string.
pub fn opt_i32_from_query(ctx: &RequestContext, name: &str) -> HandlerResult<Option<i32>> {
    optional(name, ctx.get_from_query(name))
}

/// Extracts an optional `i32` from the form body.
pub fn opt_i32_from_post(ctx: &RequestContext, name: &str) -> HandlerResult<Option<i32>> {
    optional(name, ctx.get_from_post(name))
}

/// Fails with the first parameter whose value is absent or empty.
///
/// ```rust
/// use conduit_core::params::all_present_or_die;
///
/// assert!(all_present_or_die(&[("user", Some("ana")), ("pass", Some("x"))]).is_ok());
/// let err = all_present_or_die(&[("user", Some("ana")), ("pass", Some(""))]).unwrap_err();
/// assert_eq!(err.parameter_name(), Some("pass"));
/// ```
pub fn all_present_or_die(params: &[(&str, Option<&str>)]) -> HandlerResult<()> {
    match params.iter().find(|(_, value)| !is_present(*value)) {
        Some((name, _)) => Err(HandlerError::missing_parameter(*name)),
        None => Ok(()),
    }
}

/// Returns `true` if every value is present and non-empty.
pub fn are_all_present(values: &[Option<&str>]) -> bool {
    values.iter().all(|value| is_present(*value))
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

fn required<T: FromStr>(name: &str, value: Option<&str>) -> HandlerResult<T> {
    let value = value.ok_or_else(|| HandlerError::missing_parameter(name))?;
    value
        .parse()
        .map_err(|_| HandlerError::invalid_parameter_value(name))
}

fn optional<T: FromStr>(name: &str, value: Option<&str>) -> HandlerResult<Option<T>> {
    value
        .map(|value| {
            value
                .parse()
                .map_err(|_| HandlerError::invalid_parameter_value(name))
        })
        .transpose()
}
