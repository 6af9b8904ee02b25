//! # Response Builder
//!
//! A handler answers by naming one of its contract's response variants and
//! handing the encoder a body value:
//!
//! ```ignore
//! let res = req.respond(&req.contract().success).encode(echo.to_string()).await?;
//! ```
//!
//! The body is encoded first, then the variant's configuration step runs
//! over the result, so status and headers set by the variant win over the
//! body's own content type. Canned variants skip encoding and emit their
//! stored response.
//!
//! `encode` and `encode_blocking` share one implementation and return the
//! same response or the same error. Encoding never suspends, so the blocking
//! form is safe on any thread, including a runtime worker.

use crate::body::IntoBody;
use crate::contract::RouteContract;
use crate::error::Result;
use crate::facade::TypedRequest;
use crate::request::RequestHead;
use crate::response::{Response, CONTENT_TYPE};
use crate::variant::ResponseVariant;
use tracing::warn;

/// Encoder bound to one response variant
#[derive(Debug)]
pub struct Encoder<'r, T: IntoBody> {
    head: &'r RequestHead,
    variant: &'r ResponseVariant<T>,
}

impl<C: RouteContract> TypedRequest<C> {
    /// Start a response with `variant`
    pub fn respond<'r, T: IntoBody>(&'r self, variant: &'r ResponseVariant<T>) -> Encoder<'r, T> {
        Encoder {
            head: self.head(),
            variant,
        }
    }
}

impl<'r, T: IntoBody> Encoder<'r, T> {
    fn render(&self, value: T) -> Result<Response> {
        let mut response = Response::new();

        if !self.variant.is_canned() {
            response.body = value.into_body().map_err(|err| {
                warn!(
                    method = %self.head.method,
                    path = %self.head.path(),
                    error = %err,
                    "Response body encode failed"
                );
                err
            })?;
            if let Some(content_type) = T::CONTENT_TYPE {
                response.set_header(CONTENT_TYPE, content_type);
            }
        }

        self.variant.configure(&mut response);
        Ok(response)
    }

    /// Encode `value` and apply the variant
    ///
    /// # Errors
    ///
    /// Returns `Error::BodyEncode` if the value cannot be encoded.
    pub async fn encode(self, value: T) -> Result<Response> {
        self.render(value)
    }

    /// Blocking form of [`Encoder::encode`]
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::encode`].
    pub fn encode_blocking(self, value: T) -> Result<Response> {
        self.render(value)
    }
}

impl<'r> Encoder<'r, ()> {
    /// Apply the variant with an empty body
    ///
    /// # Errors
    ///
    /// Never fails for the empty body; kept fallible to match
    /// [`Encoder::encode`].
    pub async fn empty(self) -> Result<Response> {
        self.encode(()).await
    }

    /// Blocking form of [`Encoder::empty`]
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::empty`].
    pub fn empty_blocking(self) -> Result<Response> {
        self.encode_blocking(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Json;
    use crate::contract::{Contract, ContractField, ContractFields};
    use crate::error::Error;
    use crate::request::RawRequest;
    use crate::router::Method;
    use serde::ser::{Serialize, Serializer};
    use std::collections::HashMap;

    struct Failing;

    impl Serialize for Failing {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not encodable"))
        }
    }

    struct Greet {
        ok: ResponseVariant<String>,
        created: ResponseVariant<Json<Vec<u32>>>,
        html: ResponseVariant<String>,
        teapot: ResponseVariant<()>,
        broken: ResponseVariant<Json<Failing>>,
    }

    impl ContractFields for Greet {
        fn fields(&self) -> Vec<ContractField<'_>> {
            vec![
                (&self.ok).into(),
                (&self.created).into(),
                (&self.html).into(),
                (&self.teapot).into(),
                (&self.broken).into(),
            ]
        }
    }

    impl RouteContract for Greet {
        type RequestBody = ();
    }

    fn request() -> TypedRequest<Greet> {
        let contract = Contract::new(Greet {
            ok: ResponseVariant::status(200),
            created: ResponseVariant::new(|res| {
                res.set_status(201);
                res.set_header("location", "/items/1");
            }),
            html: ResponseVariant::new(|res| res.set_header("content-type", "text/html")),
            teapot: ResponseVariant::canned(
                Response::new()
                    .with_status(418)
                    .with_header("content-type", "text/plain")
                    .with_body("short and stout"),
            ),
            broken: ResponseVariant::status(200),
        });
        let raw = RawRequest::new(Method::Get, "/greet", HashMap::new(), None);
        TypedRequest::new(contract, raw.buffer_blocking(0).unwrap())
    }

    #[tokio::test]
    async fn test_encode_text() {
        let req = request();
        let res = req.respond(&req.contract().ok).encode("10".to_string()).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.body, "10");
        assert_eq!(res.content_type(), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_configure_runs_after_encoding() {
        let req = request();
        let res = req
            .respond(&req.contract().created)
            .encode(Json(vec![1, 2]))
            .await
            .unwrap();
        assert_eq!(res.status, 201);
        assert_eq!(res.body, "[1,2]");
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.header("location"), Some("/items/1"));

        let res = req
            .respond(&req.contract().html)
            .encode("<p>hi</p>".to_string())
            .await
            .unwrap();
        assert_eq!(res.content_type(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_canned_ignores_body() {
        let req = request();
        let res = req.respond(&req.contract().teapot).empty().await.unwrap();
        assert_eq!(res.status, 418);
        assert_eq!(res.body, "short and stout");
        assert_eq!(res.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_blocking_matches_async() {
        let req = request();
        let blocking = req
            .respond(&req.contract().ok)
            .encode_blocking("Hello".to_string())
            .unwrap();
        let awaited = tokio_test::block_on(req.respond(&req.contract().ok).encode("Hello".to_string()))
            .unwrap();
        assert_eq!(blocking, awaited);

        let canned = req.respond(&req.contract().teapot).empty_blocking().unwrap();
        assert_eq!(canned.status, 418);
    }

    #[tokio::test]
    async fn test_blocking_on_current_thread_worker() {
        let req = request();
        let res = req
            .respond(&req.contract().created)
            .encode_blocking(Json(vec![3]))
            .unwrap();
        assert_eq!(res.status, 201);
        assert_eq!(res.body, "[3]");
    }

    #[tokio::test]
    async fn test_encode_failure_propagates_both_ways() {
        let req = request();
        let awaited = req
            .respond(&req.contract().broken)
            .encode(Json(Failing))
            .await
            .unwrap_err();
        let blocking = req
            .respond(&req.contract().broken)
            .encode_blocking(Json(Failing))
            .unwrap_err();
        assert!(matches!(awaited, Error::BodyEncode { .. }));
        assert_eq!(awaited.to_string(), blocking.to_string());
    }
}
