//! # HTTP Request
//!
//! Host-side request with lazy body collection.
//!
//! A [`RawRequest`] arrives from the transport with its body still
//! streaming. Before a handler sees it, the body is buffered once, bounded
//! by a size limit, producing a [`BufferedRequest`]. Requests built in
//! process (tests, internal dispatch) start out buffered and pass through
//! untouched.

use crate::bridge;
use crate::error::{Error, Result};
use crate::response::CONTENT_TYPE;
use crate::router::Method;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use hyper::HeaderMap;
use std::collections::HashMap;

/// Method, target and headers of a request
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    path: String,
    /// Raw query string (e.g., "page=1&limit=10")
    query_string: Option<String>,
    /// Request headers
    headers: HeaderMap,
    /// Raw path parameters filled in by the router
    path_params: HashMap<String, String>,
}

impl RequestHead {
    fn new(method: Method, path: String, query_string: Option<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path,
            query_string,
            headers,
            path_params: HashMap::new(),
        }
    }

    /// Request path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// First value of a header (case-insensitive); `None` if absent or not
    /// visible ASCII
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set or override a header
    ///
    /// Invalid names or values are ignored.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// All headers
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Declared body content type
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Declared body length, if the header is present and well-formed
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|len| len.trim().parse().ok())
    }

    /// Raw path parameter
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Replace the raw path parameters
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }
}

enum RawBody {
    Buffered(Bytes),
    Streaming(Incoming),
}

/// Request as received from the host, body possibly still streaming
pub struct RawRequest {
    head: RequestHead,
    body: RawBody,
}

impl RawRequest {
    /// Build an already-buffered request (for testing/internal use)
    ///
    /// `uri` may carry a query string. Headers with invalid names or values
    /// are dropped.
    #[must_use]
    pub fn new(
        method: Method,
        uri: &str,
        headers_map: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let (path, query_string) = match uri.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (uri.to_string(), None),
        };

        let mut head = RequestHead::new(method, path, query_string, HeaderMap::new());
        for (k, v) in &headers_map {
            head.set_header(k, v);
        }

        Self {
            head,
            body: RawBody::Buffered(body.unwrap_or_default()),
        }
    }

    /// Wrap a hyper request without reading its body
    #[must_use]
    pub fn from_hyper(method: Method, req: hyper::Request<Incoming>) -> Self {
        let (parts, body) = req.into_parts();
        let head = RequestHead::new(
            method,
            parts.uri.path().to_string(),
            parts.uri.query().map(String::from),
            parts.headers,
        );
        Self {
            head,
            body: RawBody::Streaming(body),
        }
    }

    /// Method, target and headers
    #[must_use]
    pub const fn head(&self) -> &RequestHead {
        &self.head
    }

    /// Mutable head
    pub fn head_mut(&mut self) -> &mut RequestHead {
        &mut self.head
    }

    /// Whether the body has already been read
    #[must_use]
    pub const fn is_buffered(&self) -> bool {
        matches!(self.body, RawBody::Buffered(_))
    }

    /// Read the whole body, bounded by `limit` bytes
    ///
    /// An already-buffered body is returned as is.
    ///
    /// # Errors
    ///
    /// Returns `Error::PayloadTooLarge` if the body exceeds `limit`, or
    /// `Error::Http` if the transport fails mid-body.
    pub async fn buffer(self, limit: usize) -> Result<BufferedRequest> {
        let body = match self.body {
            RawBody::Buffered(bytes) => bytes,
            RawBody::Streaming(incoming) => {
                collect_limited(incoming, self.head.content_length(), limit).await?
            }
        };
        Ok(BufferedRequest {
            head: self.head,
            body,
        })
    }

    /// Blocking form of [`RawRequest::buffer`]
    ///
    /// Only a streaming body goes through [`bridge::wait`]; see there for
    /// which threads may block.
    ///
    /// # Errors
    ///
    /// Same as [`RawRequest::buffer`].
    pub fn buffer_blocking(self, limit: usize) -> Result<BufferedRequest> {
        match self.body {
            RawBody::Buffered(body) => Ok(BufferedRequest {
                head: self.head,
                body,
            }),
            RawBody::Streaming(_) => bridge::wait(self.buffer(limit)),
        }
    }
}

impl std::fmt::Debug for RawRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRequest")
            .field("head", &self.head)
            .field("buffered", &self.is_buffered())
            .finish()
    }
}

/// Collect a body into memory, refusing more than `limit` bytes
///
/// A declared `Content-Length` over the limit is rejected before reading.
///
/// # Errors
///
/// Returns `Error::PayloadTooLarge`, `Error::Http` or `Error::Io`.
pub async fn collect_limited<B>(body: B, declared_len: Option<usize>, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(len) = declared_len {
        if len > limit {
            return Err(Error::PayloadTooLarge { limit, actual: len });
        }
    }

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<LengthLimitError>() => Err(Error::PayloadTooLarge {
            limit,
            actual: declared_len.unwrap_or_else(|| limit.saturating_add(1)),
        }),
        Err(err) => match err.downcast::<hyper::Error>() {
            Ok(hyper_err) => Err(Error::Http(*hyper_err)),
            Err(other) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                other,
            ))),
        },
    }
}

/// Request whose body has been fully read
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    head: RequestHead,
    body: Bytes,
}

impl BufferedRequest {
    /// Method, target and headers
    #[must_use]
    pub const fn head(&self) -> &RequestHead {
        &self.head
    }

    /// Mutable head
    pub fn head_mut(&mut self) -> &mut RequestHead {
        &mut self.head
    }

    /// Body bytes
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
