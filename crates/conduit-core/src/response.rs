//! Handler responses.
//!
//! A [`Response`] is a status, a header map and a fully buffered body. The
//! transport adapter turns it into bytes on the wire through a response
//! sink.

use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;

use crate::error::{HandlerError, HandlerResult};
use crate::headers;

/// Redirect statuses a handler may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectKind {
    /// 300
    MultipleChoices,
    /// 301
    MovedPermanently,
    /// 302
    Found,
    /// 303
    SeeOther,
    /// 307
    TemporaryRedirect,
}

impl RedirectKind {
    /// Returns the status code for this redirect.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MultipleChoices => StatusCode::MULTIPLE_CHOICES,
            Self::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
            Self::Found => StatusCode::FOUND,
            Self::SeeOther => StatusCode::SEE_OTHER,
            Self::TemporaryRedirect => StatusCode::TEMPORARY_REDIRECT,
        }
    }
}

/// A cookie to set on the client.
///
/// # Example
///
/// ```rust
/// use conduit_core::SetCookie;
/// use std::time::Duration;
///
/// let cookie = SetCookie::new("session", "abc123")
///     .path("/")
///     .max_age(Duration::from_secs(3600))
///     .http_only(true);
/// assert_eq!(
///     cookie.to_header_value(),
///     "session=abc123; Path=/; Max-Age=3600; HttpOnly"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<Duration>,
    http_only: bool,
    secure: bool,
}

impl SetCookie {
    /// Create a cookie with a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            max_age: None,
            http_only: false,
            secure: false,
        }
    }

    /// Set the `Path` attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the `Max-Age` attribute.
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Set the `HttpOnly` flag.
    #[must_use]
    pub const fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the `Secure` flag.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Render the `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        if let Some(ref path) = self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.join("; ")
    }
}

/// A complete HTTP response produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// An empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn with_content(status: StatusCode, content_type: &'static str, body: Bytes) -> Self {
        Self::new(status)
            .with_header(headers::CONTENT_TYPE, HeaderValue::from_static(content_type))
            .with_body(body)
    }

    /// 200 with a plain text body.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::with_content(StatusCode::OK, headers::CONTENT_TYPE_TEXT, Bytes::from(body))
    }

    /// 200 with an HTML body.
    pub fn html(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::with_content(StatusCode::OK, headers::CONTENT_TYPE_HTML, Bytes::from(body))
    }

    /// 200 with `value` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> HandlerResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::with_content(
            StatusCode::OK,
            headers::CONTENT_TYPE_JSON,
            Bytes::from(body),
        ))
    }

    /// 200 with an already serialized JSON body.
    pub fn json_raw(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::with_content(StatusCode::OK, headers::CONTENT_TYPE_JSON, Bytes::from(body))
    }

    /// A redirect to `location`.
    ///
    /// Fails with [`HandlerError::InvalidParameterValue`] if `location` is
    /// not a valid header value.
    pub fn redirect(kind: RedirectKind, location: &str) -> HandlerResult<Self> {
        let location = HeaderValue::from_str(location)
            .map_err(|_| HandlerError::invalid_parameter_value("location"))?;
        Ok(Self::new(kind.status()).with_header(headers::LOCATION, location))
    }

    /// 400 with the body `400 Bad request`.
    pub fn bad_request() -> Self {
        Self::text("400 Bad request").with_status(StatusCode::BAD_REQUEST)
    }

    /// 401 with the body `401 Not authorized`.
    pub fn not_authorized() -> Self {
        Self::text("401 Not authorized").with_status(StatusCode::UNAUTHORIZED)
    }

    /// 404 with the body `404 Not found`.
    pub fn not_found() -> Self {
        Self::text("404 Not found").with_status(StatusCode::NOT_FOUND)
    }

    /// 503 with the body `503 Service unavailable`.
    pub fn service_unavailable() -> Self {
        Self::text("503 Service unavailable").with_status(StatusCode::SERVICE_UNAVAILABLE)
    }

    /// 500 with the body `500 Internal server error`.
    pub fn internal_error() -> Self {
        Self::text("500 Internal server error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Replaces the status.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends a `Set-Cookie` header.
    pub fn with_cookie(self, cookie: &SetCookie) -> HandlerResult<Self> {
        let value = HeaderValue::from_str(&cookie.to_header_value())
            .map_err(|_| HandlerError::invalid_parameter_value("cookie"))?;
        Ok(self.with_header(headers::SET_COOKIE, value))
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body length in bytes.
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    /// Converts into an `http` response.
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
