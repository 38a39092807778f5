//! Buffered requests and responses passed between the server, the router,
//! the network and the cache.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Header telling clients how the edge answered.
pub const CACHE_STATUS_HEADER: &str = "x-edge-cache";

/// Headers that only apply to a single connection.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// A request as seen by the edge, with its body read into memory.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub method: Method,
    /// Path plus query string; also the cache key.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeRequest {
    /// A bodyless GET, used for precaching and refreshes.
    #[must_use]
    pub fn get(path_and_query: &str) -> Self {
        Self {
            method: Method::GET,
            path_and_query: path_and_query.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path)
    }

    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.path_and_query
    }

    /// Requests carrying a cookie may get a personalised answer.
    #[must_use]
    pub fn is_personalised(&self) -> bool {
        self.headers.contains_key(header::COOKIE)
    }
}

/// A complete response, as fetched from the origin or read from a bucket.
#[derive(Debug, Clone)]
pub struct EdgeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeResponse {
    #[must_use]
    pub fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Whether this response may be written to a bucket.
    ///
    /// Only 2xx responses without a `Set-Cookie` header are stored.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        self.status.is_success() && !self.headers.contains_key(header::SET_COOKIE)
    }

    #[must_use]
    pub fn with_cache_status(mut self, status: CacheStatus) -> Self {
        self.headers.insert(
            HeaderName::from_static(CACHE_STATUS_HEADER),
            HeaderValue::from_static(status.as_str()),
        );
        self
    }

    #[must_use]
    pub fn cache_status(&self) -> Option<&str> {
        self.headers
            .get(CACHE_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for EdgeResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a bucket without asking the origin.
    Hit,
    /// Fetched from the origin.
    Miss,
    /// The origin failed and a bucket answered instead.
    Stale,
    /// Neither answered; a bundled payload was served.
    Offline,
    /// Forwarded without touching the cache.
    Bypass,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Stale => "stale",
            Self::Offline => "offline",
            Self::Bypass => "bypass",
        }
    }
}

/// Copy `headers` without hop-by-hop headers, `Host` or `Content-Length`.
#[must_use]
pub fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(&name_str)
            || *name == header::HOST
            || *name == header::CONTENT_LENGTH
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
