//! Request value consumed by the recognizer and handed to handlers.

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage; names are shared `Arc<str>`, values are per request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The parts of an HTTP request the router looks at, plus whatever the host
/// server wants to pass through to handlers.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path without the query string, as received.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderVec,
    pub body: Option<Value>,
}

impl Request {
    /// Build a request from a method and a request target, splitting off the
    /// query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Header lookup, case-insensitive per RFC 7230.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canonical form of a request path.
///
/// Ensures a single leading slash, collapses repeated slashes, strips
/// trailing slashes and upper-cases percent escapes so `%2f` and `%2F`
/// compare equal. An empty result becomes `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' => {
                if !out.ends_with('/') {
                    out.push('/');
                }
            }
            '%' => {
                out.push('%');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            out.push(h.to_ascii_uppercase());
                            chars.next();
                        }
                        _ => break,
                    }
                }
            }
            other => out.push(other),
        }
    }
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Percent-decode one recognized value. Invalid UTF-8 leaves it as received.
pub fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('%') {
        return Cow::Borrowed(value);
    }
    match urlencoding::decode(value) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("photos"), "/photos");
        assert_eq!(normalize_path("//photos///1/"), "/photos/1");
        assert_eq!(normalize_path("/search/caf%c3%a9"), "/search/caf%C3%A9");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_request_splits_query() {
        let req = Request::new(Method::GET, "/photos?page=2");
        assert_eq!(req.path, "/photos");
        assert_eq!(req.query.as_deref(), Some("page=2"));
        let req = req.with_header("Accept", "text/html");
        assert_eq!(req.get_header("accept"), Some("text/html"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("caf%C3%A9"), "café");
        assert_eq!(unescape("plain"), "plain");
        assert_eq!(unescape("bad%FF"), "bad%FF");
    }
}
