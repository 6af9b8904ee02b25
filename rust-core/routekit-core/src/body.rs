//! # Response Bodies
//!
//! Wire encoding of the values a response variant carries.
//!
//! Each body type names the content type it would set on its own. A
//! response variant's configuration runs after encoding and may override it.

use crate::error::{Error, Result};
use crate::json::{to_json, APPLICATION_JSON};
use hyper::body::Bytes;
use serde::Serialize;
use std::any::type_name;

/// A value that can be encoded as a response body
pub trait IntoBody: Send + 'static {
    /// Content type this body sets when encoded
    const CONTENT_TYPE: Option<&'static str>;

    /// Encode into wire bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::BodyEncode` if the value has no wire representation
    fn into_body(self) -> Result<Bytes>;
}

impl IntoBody for () {
    const CONTENT_TYPE: Option<&'static str> = None;

    fn into_body(self) -> Result<Bytes> {
        Ok(Bytes::new())
    }
}

impl IntoBody for String {
    const CONTENT_TYPE: Option<&'static str> = Some("text/plain; charset=utf-8");

    fn into_body(self) -> Result<Bytes> {
        Ok(Bytes::from(self))
    }
}

impl IntoBody for &'static str {
    const CONTENT_TYPE: Option<&'static str> = Some("text/plain; charset=utf-8");

    fn into_body(self) -> Result<Bytes> {
        Ok(Bytes::from_static(self.as_bytes()))
    }
}

impl IntoBody for Bytes {
    const CONTENT_TYPE: Option<&'static str> = Some("application/octet-stream");

    fn into_body(self) -> Result<Bytes> {
        Ok(self)
    }
}

impl IntoBody for Vec<u8> {
    const CONTENT_TYPE: Option<&'static str> = Some("application/octet-stream");

    fn into_body(self) -> Result<Bytes> {
        Ok(Bytes::from(self))
    }
}

/// JSON body wrapper
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T: Serialize + Send + 'static> IntoBody for Json<T> {
    const CONTENT_TYPE: Option<&'static str> = Some(APPLICATION_JSON);

    fn into_body(self) -> Result<Bytes> {
        to_json(&self.0)
            .map(Bytes::from)
            .map_err(|e| Error::BodyEncode {
                body_type: type_name::<T>(),
                reason: e.to_string(),
            })
    }
}

/// Body type tag reported by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BodyType {
    /// Rust type name of the body
    pub name: &'static str,
    /// Content type the body sets on its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'static str>,
}

impl BodyType {
    /// Tag for body type `T`
    #[must_use]
    pub fn of<T: IntoBody>() -> Self {
        Self {
            name: type_name::<T>(),
            content_type: T::CONTENT_TYPE,
        }
    }
}
