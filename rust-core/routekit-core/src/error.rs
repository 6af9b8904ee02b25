//! # Error Handling
//!
//! Centralized error types for routekit.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Parameter coercion never produces an [`Error`]: a malformed query or
//! header value reads as absent. Errors here are either host failures
//! (binding, transport, body limits) or body decode/encode failures.

use thiserror::Error;

/// Result type alias for routekit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the routekit runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Router failed to match the requested path
    #[error("No route found for path: {path}")]
    RouteNotFound {
        /// The path that wasn't matched
        path: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },

    /// No decoder is registered for the request content type
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// The content type of the request body
        content_type: String,
    },

    /// The request body could not be decoded into the declared type
    #[error("Failed to decode {content_type} body: {reason}")]
    BodyDecode {
        /// Content type the decoder was selected for
        content_type: String,
        /// Decoder message
        reason: String,
    },

    /// A response body value could not be encoded
    #[error("Failed to encode {body_type} body: {reason}")]
    BodyEncode {
        /// Name of the body type
        body_type: &'static str,
        /// Encoder message
        reason: String,
    },
}

impl Error {
    /// HTTP status the host answers with when this error escapes a handler
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound { .. } => 404,
            Self::PayloadTooLarge { .. } => 413,
            Self::UnsupportedMediaType { .. } => 415,
            Self::BodyDecode { .. } | Self::Json(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_error() {
        let err = Error::RouteNotFound {
            path: "/unknown".to_string(),
        };
        assert!(err.to_string().contains("/unknown"));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_bind_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = Error::BindError {
            address: "0.0.0.0:8000".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("0.0.0.0:8000"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_body_errors_map_to_client_statuses() {
        let decode = Error::BodyDecode {
            content_type: "application/json".to_string(),
            reason: "eof".to_string(),
        };
        assert_eq!(decode.status_code(), 400);

        let media = Error::UnsupportedMediaType {
            content_type: "application/xml".to_string(),
        };
        assert_eq!(media.status_code(), 415);
        assert!(media.to_string().contains("application/xml"));

        let large = Error::PayloadTooLarge {
            limit: 10,
            actual: 20,
        };
        assert_eq!(large.status_code(), 413);
    }
}
