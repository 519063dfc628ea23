//! Request handling.
//!
//! # Responsibilities
//! - Carry the routing-relevant view of a request (method, host, path, scheme)
//! - Generate a request ID as early as possible for tracing
//!
//! # Design Decisions
//! - Host is stored without its port
//! - Path excludes the query string
//! - Scheme comes from the listener, or from `X-Forwarded-Proto` only when
//!   the listener trusts it

use axum::{
    body::Body,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response as AxumResponse,
};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Scheme header set by a TLS-terminating proxy.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Routing view of an HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    host: String,
    secure: bool,
    headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path, None),
        };
        Self {
            method,
            path,
            query,
            host: String::new(),
            secure: false,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Build from the head of an incoming request.
    ///
    /// `X-Forwarded-Proto` is read only when `trust_forwarded_proto` is set;
    /// otherwise any client could mark itself secure.
    pub fn from_parts(parts: &Parts, secure: bool, trust_forwarded_proto: bool) -> Self {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.host().map(str::to_string))
            .unwrap_or_default();

        let forwarded_https = trust_forwarded_proto
            && parts
                .headers
                .get(X_FORWARDED_PROTO)
                .and_then(|h| h.to_str().ok())
                .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
        let secure = secure
            || forwarded_https
            || parts.uri.scheme_str() == Some("https");

        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            host: strip_port(&host).to_string(),
            secure,
            headers: parts.headers.clone(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

fn strip_port(host: &str) -> &str {
    if host.ends_with(']') {
        return host;
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Axum middleware: ensure every request carries an `x-request-id` and echo
/// it on the response.
pub async fn request_id(mut request: axum::http::Request<Body>, next: Next) -> AxumResponse {
    let existing = request.headers().get(X_REQUEST_ID).cloned();
    let id = match existing {
        Some(id) => id,
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            match HeaderValue::from_str(&generated) {
                Ok(value) => {
                    request.headers_mut().insert(X_REQUEST_ID, value.clone());
                    value
                }
                Err(_) => return next.run(request).await,
            }
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().insert(X_REQUEST_ID, id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_split() {
        let request = Request::get("/search?q=rust");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query(), Some("q=rust"));
    }

    fn forwarded_parts() -> Parts {
        axum::http::Request::builder()
            .method(Method::PUT)
            .uri("/users/1?x=1")
            .header("Host", "Example.com:8080")
            .header("X-Forwarded-Proto", "https")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_from_parts() {
        let request = Request::from_parts(&forwarded_parts(), false, true);
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.path(), "/users/1");
        assert_eq!(request.query(), Some("x=1"));
        assert_eq!(request.host(), "Example.com");
        assert!(request.is_secure());
    }

    #[test]
    fn test_forwarded_proto_ignored_unless_trusted() {
        let parts = forwarded_parts();
        assert!(!Request::from_parts(&parts, false, false).is_secure());
        assert!(Request::from_parts(&parts, true, false).is_secure());
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:80"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
    }
}
