//! HTTP methods understood by the route table.
//!
//! Only the four methods Conduit dispatches are modelled. Everything else
//! parses to [`HttpMethod::Unsupported`], which can never be registered and
//! never matches.

use std::fmt;

/// HTTP method of a route or an incoming request.
///
/// # Example
///
/// ```rust
/// use conduit_router::HttpMethod;
///
/// assert_eq!(HttpMethod::parse("get"), HttpMethod::Get);
/// assert_eq!(HttpMethod::parse("PATCH"), HttpMethod::Unsupported);
/// assert!(HttpMethod::Post.is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// Any other method.
    Unsupported,
}

impl HttpMethod {
    /// All methods that can carry routes.
    pub const SUPPORTED: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Parses a method name, ignoring ASCII case.
    #[must_use]
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") {
            Self::Get
        } else if method.eq_ignore_ascii_case("POST") {
            Self::Post
        } else if method.eq_ignore_ascii_case("PUT") {
            Self::Put
        } else if method.eq_ignore_ascii_case("DELETE") {
            Self::Delete
        } else {
            Self::Unsupported
        }
    }

    /// Returns `true` for every method except [`HttpMethod::Unsupported`].
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&http::Method> for HttpMethod {
    fn from(method: &http::Method) -> Self {
        match *method {
            http::Method::GET => Self::Get,
            http::Method::POST => Self::Post,
            http::Method::PUT => Self::Put,
            http::Method::DELETE => Self::Delete,
            _ => Self::Unsupported,
        }
    }
}

impl From<http::Method> for HttpMethod {
    fn from(method: http::Method) -> Self {
        Self::from(&method)
    }
}
