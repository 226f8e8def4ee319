//! Request context types.
//!
//! A [`RequestContext`] is built once per request by the transport adapter
//! and handed to the matched handler by value. Query parameters, form
//! parameters and cookies are parsed lazily on first access.

use std::collections::HashMap;
use std::sync::OnceLock;

use bytes::Bytes;
use conduit_router::HttpMethod;
use http::header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use tracing::warn;
use uuid::Uuid;

use crate::error::{HandlerError, HandlerResult};
use crate::headers;

type ParamMap = IndexMap<String, Vec<String>>;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps access log lines and handler
/// diagnostics sortable by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a handler may read about the physical request.
///
/// # Example
///
/// ```
/// use conduit_core::RequestContext;
///
/// let ctx = RequestContext::new("GET", "/search")
///     .with_query("q=rust+routing&tag=a&tag=b")
///     .with_header(http::header::COOKIE, http::HeaderValue::from_static("sid=42"));
///
/// assert_eq!(ctx.get_from_query("q"), Some("rust routing"));
/// assert_eq!(ctx.get_multiple_from_query("tag"), vec!["a", "b"]);
/// assert_eq!(ctx.get_cookie("sid"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: HttpMethod,
    method_name: String,
    path: String,
    raw_query: Option<String>,
    protocol: String,
    remote_addr: Option<String>,
    host: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    route_path: String,
    path_info: String,
    query_params: OnceLock<ParamMap>,
    post_params: OnceLock<ParamMap>,
    cookies: OnceLock<HashMap<String, String>>,
}

impl RequestContext {
    /// Creates a context for `method` and `path` with no headers or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let method_name = method.into();
        Self {
            request_id: RequestId::new(),
            method: HttpMethod::parse(&method_name),
            method_name,
            path: path.into(),
            raw_query: None,
            protocol: "HTTP/1.1".to_string(),
            remote_addr: None,
            host: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            route_path: String::new(),
            path_info: String::new(),
            query_params: OnceLock::new(),
            post_params: OnceLock::new(),
            cookies: OnceLock::new(),
        }
    }

    /// Converts an `http` request into a context.
    ///
    /// The host is taken from the URI authority, falling back to the `Host`
    /// header.
    pub fn from_request(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let host = parts.uri.host().map(str::to_string);
        let mut ctx = Self::new(parts.method.as_str(), parts.uri.path())
            .with_protocol(format!("{:?}", parts.version))
            .with_headers(parts.headers)
            .with_body(body);
        if let Some(query) = parts.uri.query() {
            ctx = ctx.with_query(query);
        }
        if let Some(host) = host {
            ctx = ctx.with_host(host);
        }
        ctx
    }

    /// Sets the raw query string (without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = Some(raw_query.into());
        self.query_params = OnceLock::new();
        self
    }

    /// Sets the protocol, e.g. `HTTP/1.1`.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = Some(remote_addr.into());
        self
    }

    /// Sets the server name the request was addressed to.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self.post_params = OnceLock::new();
        self.cookies = OnceLock::new();
        self
    }

    /// Appends a header value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self.post_params = OnceLock::new();
        self.cookies = OnceLock::new();
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.post_params = OnceLock::new();
        self
    }

    /// Records the matched route's path and the part of the request path
    /// beyond it.
    #[must_use]
    pub fn with_route_match(
        mut self,
        route_path: impl Into<String>,
        path_info: impl Into<String>,
    ) -> Self {
        self.route_path = route_path.into();
        self.path_info = path_info.into();
        self
    }

    /// Returns the request ID.
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the parsed method.
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the method exactly as received.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Returns the protocol.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Returns the client address.
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Returns the server name without any port.
    ///
    /// Uses the explicit host if one was set, otherwise the `Host` header.
    pub fn host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .or_else(|| self.get_header(headers::HOST))
            .map(strip_port)
    }

    /// Returns all headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of a header, if it is valid text.
    pub fn get_header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns every textual value of a header.
    pub fn get_header_values<K: AsHeaderName>(&self, name: K) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect()
    }

    /// Returns the raw body.
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the path of the matched route as registered.
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Returns the part of the request path beyond the matched route.
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// Returns the first query value for `name`.
    pub fn get_from_query(&self, name: &str) -> Option<&str> {
        first(self.query_params(), name)
    }

    /// Returns every query value for `name`, in request order.
    pub fn get_multiple_from_query(&self, name: &str) -> Vec<&str> {
        all(self.query_params(), name)
    }

    /// Returns the query value for `name`, or `default`.
    pub fn opt_from_query<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_from_query(name).unwrap_or(default)
    }

    /// Returns the first form value for `name`.
    ///
    /// Form values are only read from POST requests with a URL-encoded
    /// body.
    pub fn get_from_post(&self, name: &str) -> Option<&str> {
        first(self.post_params(), name)
    }

    /// Returns every form value for `name`, in body order.
    pub fn get_multiple_from_post(&self, name: &str) -> Vec<&str> {
        all(self.post_params(), name)
    }

    /// Returns the form value for `name`, or `default`.
    pub fn opt_from_post<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_from_post(name).unwrap_or(default)
    }

    /// Returns a cookie value by name.
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .get_or_init(|| parse_cookies(&self.headers))
            .get(name)
            .map(String::as_str)
    }

    /// Splits the path info into its non-blank segments.
    ///
    /// `/a//b/` yields `["a", "b"]`. A `..` segment is rejected.
    pub fn path_info_params(&self) -> HandlerResult<Vec<&str>> {
        let segments: Vec<&str> = self
            .path_info
            .split('/')
            .filter(|segment| !segment.trim().is_empty())
            .collect();

        if segments.contains(&"..") {
            warn!(path = %self.path, "path info contains '..'");
            return Err(HandlerError::invalid_parameter_value("path_info"));
        }
        Ok(segments)
    }

    /// Returns the path info segment at `index`.
    pub fn get_from_path_info(&self, index: usize) -> HandlerResult<Option<&str>> {
        Ok(self.path_info_params()?.get(index).copied())
    }

    fn query_params(&self) -> &ParamMap {
        self.query_params.get_or_init(|| {
            self.raw_query
                .as_deref()
                .map_or_else(ParamMap::new, |raw| parse_params(raw.as_bytes()))
        })
    }

    fn post_params(&self) -> &ParamMap {
        self.post_params.get_or_init(|| {
            let is_form = self
                .get_header(headers::CONTENT_TYPE)
                .is_some_and(|value| {
                    value
                        .to_ascii_lowercase()
                        .contains(headers::CONTENT_TYPE_FORM)
                });
            if self.method == HttpMethod::Post && is_form {
                parse_params(&self.body)
            } else {
                ParamMap::new()
            }
        })
    }
}

fn first<'a>(params: &'a ParamMap, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(|values| values.first())
        .map(String::as_str)
}

fn all<'a>(params: &'a ParamMap, name: &str) -> Vec<&'a str> {
    params
        .get(name)
        .map(|values| values.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn parse_params(raw: &[u8]) -> ParamMap {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw).unwrap_or_default();
    let mut params = ParamMap::new();
    for (name, value) in pairs {
        params.entry(name).or_default().push(value);
    }
    params
}

fn parse_cookies(map: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in map.get_all(headers::COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for cookie in header.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                let value = value.trim().trim_matches('"');
                cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }
    cookies
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}
