//! Header names and content types used across Conduit.

use http::header::HeaderName;

/// `Content-Type`
pub const CONTENT_TYPE: HeaderName = http::header::CONTENT_TYPE;
/// `Location`
pub const LOCATION: HeaderName = http::header::LOCATION;
/// `Host`
pub const HOST: HeaderName = http::header::HOST;
/// `Referer`
pub const REFERRER: HeaderName = http::header::REFERER;
/// `User-Agent`
pub const USER_AGENT: HeaderName = http::header::USER_AGENT;
/// `Cookie`
pub const COOKIE: HeaderName = http::header::COOKIE;
/// `Set-Cookie`
pub const SET_COOKIE: HeaderName = http::header::SET_COOKIE;
/// `Cache-Control`
pub const CACHE_CONTROL: HeaderName = http::header::CACHE_CONTROL;

/// Plain text in UTF-8.
pub const CONTENT_TYPE_TEXT: &str = "text/plain;charset=UTF-8";
/// HTML in UTF-8.
pub const CONTENT_TYPE_HTML: &str = "text/html;charset=UTF-8";
/// JSON in UTF-8.
pub const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";
/// URL-encoded form bodies.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
/// `no-cache`
pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache";
