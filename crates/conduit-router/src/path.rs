//! Path normalization and prefix comparison.
//!
//! Every lookup in the route table goes through [`normalize_path`]: the path
//! is lower-cased and a single trailing separator is removed, except for the
//! root path itself.

/// The path separator.
pub const SEPARATOR: char = '/';

/// Normalizes a path for comparison.
///
/// # Example
///
/// ```rust
/// use conduit_router::path::normalize_path;
///
/// assert_eq!(normalize_path("/Users/"), "/users");
/// assert_eq!(normalize_path("/"), "/");
/// assert_eq!(normalize_path("/a//"), "/a/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.to_lowercase();
    if normalized.len() > 1 && normalized.ends_with(SEPARATOR) {
        normalized.pop();
    }
    normalized
}

/// Returns `true` if `path` ends with the separator.
#[must_use]
pub fn ends_with_separator(path: &str) -> bool {
    path.ends_with(SEPARATOR)
}

/// Checks whether a normalized request path falls under a prefix.
///
/// `prefix` is a lower-cased pattern that ends with the separator. The bare
/// directory (`/api` for the prefix `/api/`) also counts as a match, since
/// normalization strips the separator the client sent.
#[must_use]
pub fn matches_prefix(normalized_path: &str, prefix: &str) -> bool {
    normalized_path.starts_with(prefix)
        || (prefix.len() > 1 && prefix.strip_suffix(SEPARATOR) == Some(normalized_path))
}

/// Returns the part of `path` beyond `prefix`, comparing case-insensitively.
///
/// Returns `None` when `path` does not start with `prefix`. The remainder
/// keeps the original casing of `path`.
///
/// # Example
///
/// ```rust
/// use conduit_router::path::strip_prefix_ignore_case;
///
/// assert_eq!(strip_prefix_ignore_case("/Static/Logo.PNG", "/static/"), Some("Logo.PNG"));
/// assert_eq!(strip_prefix_ignore_case("/other", "/static/"), None);
/// ```
#[must_use]
pub fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = path.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let offset = rest.next().map_or(path.len(), |(idx, _)| idx);
    Some(&path[offset..])
}
