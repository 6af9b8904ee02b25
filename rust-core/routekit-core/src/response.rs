//! # HTTP Response
//!
//! Host response value handed back to the transport: a status code, an
//! ordered header multimap and an already-encoded body.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::StatusCode;
use tracing::warn;

/// Content-Type header name
pub const CONTENT_TYPE: &str = "content-type";

/// HTTP response produced by handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers, in insertion order (names compare case-insensitively)
    headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }
}

impl Response {
    /// Empty 200 response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON response from an already-serialized body
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self::default()
            .with_header(CONTENT_TYPE, "application/json")
            .with_body(Bytes::from(Into::<String>::into(body)))
    }

    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::default()
            .with_header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .with_body(Bytes::from(Into::<String>::into(body)))
    }

    /// Bodyless response with `status`
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::default().with_status(status)
    }

    /// Set status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous values
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set status code in place
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Set or override a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.append_header(name, value);
    }

    /// Add a header value without removing existing ones
    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
    }

    /// Remove all values of a header
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// First value of a header
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in insertion order
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Content type, if one was set
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Convert to hyper Response
    ///
    /// Headers that are not valid HTTP are dropped with a warning.
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = hyper::Response::new(Full::new(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    headers.append(n, v);
                }
                _ => warn!(header = %name, "Dropping invalid response header"),
            }
        }
        response
    }
}
