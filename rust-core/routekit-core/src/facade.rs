//! # Typed Request Facade
//!
//! What a handler receives instead of the raw request: typed reads of
//! query parameters, headers and path parameters through the route's
//! contract descriptors, plus body decoding into the contract's declared
//! request body type.
//!
//! Reads are soft. A parameter that is missing or fails to coerce resolves
//! to its declared default, or `None` if it has none.
//!
//! The query string is parsed once, on first access, and reused for the
//! rest of the request. Sub-facades borrow the facade and never outlive it.

use crate::coerce::ParamValue;
use crate::contract::{Contract, RouteContract};
use crate::error::{Error, Result};
use crate::json::{is_json_media_type, parse_json_bytes};
use crate::param::{HeaderParam, Param, QuerySource};
use crate::request::{BufferedRequest, RequestHead};
use crate::response::CONTENT_TYPE;
use crate::router::Method;
use hyper::body::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;
use url::form_urlencoded;

/// Request seen through a route contract
pub struct TypedRequest<C: RouteContract> {
    contract: Arc<Contract<C>>,
    request: BufferedRequest,
    query: OnceLock<HashMap<String, String>>,
}

impl<C: RouteContract> TypedRequest<C> {
    /// Bind a buffered request to its route's contract
    #[must_use]
    pub fn new(contract: Arc<Contract<C>>, request: BufferedRequest) -> Self {
        Self {
            contract,
            request,
            query: OnceLock::new(),
        }
    }

    /// The route's contract
    #[must_use]
    pub fn contract(&self) -> &Contract<C> {
        &self.contract
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> Method {
        self.request.head().method
    }

    /// Request path
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.head().path()
    }

    /// Method, target and headers
    #[must_use]
    pub const fn head(&self) -> &RequestHead {
        self.request.head()
    }

    /// Raw body bytes
    #[must_use]
    pub const fn body_bytes(&self) -> &Bytes {
        self.request.body()
    }

    /// Typed query accessor
    pub fn query(&self) -> QueryParams<'_> {
        let pairs = self
            .query
            .get_or_init(|| parse_query_string(self.request.head().query_string()));
        QueryParams { pairs }
    }

    /// Typed header accessor
    #[must_use]
    pub const fn headers(&self) -> Headers<'_> {
        Headers {
            head: self.request.head(),
        }
    }

    /// Path parameter `name` coerced to `T`; `None` if absent or malformed
    #[must_use]
    pub fn path_param<T: ParamValue>(&self, name: &str) -> Option<T> {
        self.request.head().path_param(name).and_then(T::from_raw)
    }

    /// Decode the body into the contract's request body type
    ///
    /// # Errors
    ///
    /// See [`TypedRequest::decode_body_with`].
    pub fn decode_body(&mut self) -> Result<C::RequestBody> {
        self.decode_body_with(&DefaultDecoder)
    }

    /// Decode the body with an explicit decoder
    ///
    /// A request without a content type takes the contract's default content
    /// type first; the header stays set for the rest of the request.
    ///
    /// # Errors
    ///
    /// Whatever the decoder reports, unchanged.
    pub fn decode_body_with<D: BodyDecoder>(&mut self, decoder: &D) -> Result<C::RequestBody> {
        if self.request.head().content_type().is_none() {
            if let Some(default) = self.contract.default_content_type() {
                self.request.head_mut().set_header(CONTENT_TYPE, default);
            }
        }

        let content_type = self.request.head().content_type();
        decoder
            .decode(content_type, self.request.body())
            .map_err(|err| {
                warn!(
                    contract = %self.contract.shape().name,
                    content_type = content_type.unwrap_or_default(),
                    error = %err,
                    "Request body decode failed"
                );
                err
            })
    }
}

impl<C: RouteContract> std::fmt::Debug for TypedRequest<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRequest")
            .field("contract", &self.contract.shape().name)
            .field("head", self.request.head())
            .finish_non_exhaustive()
    }
}

/// Query string as a key/value map; the first occurrence of a key wins
fn parse_query_string(query: Option<&str>) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            pairs.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    pairs
}

/// Typed view of the query string
#[derive(Debug, Clone, Copy)]
pub struct QueryParams<'a> {
    pairs: &'a HashMap<String, String>,
}

impl QueryParams<'_> {
    /// Value of a query or nested query parameter
    #[must_use]
    pub fn get<S: QuerySource, T: ParamValue>(&self, param: &Param<S, T>) -> Option<T> {
        param.resolve(self.raw(&param.key()))
    }

    /// Undecoded value under `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }
}

/// Typed view of the request headers
#[derive(Debug, Clone, Copy)]
pub struct Headers<'a> {
    head: &'a RequestHead,
}

impl Headers<'_> {
    /// First value of a header parameter
    #[must_use]
    pub fn get<T: ParamValue>(&self, param: &HeaderParam<T>) -> Option<T> {
        param.resolve(self.head.header(&param.key()))
    }

    /// Undecoded first value of header `name`
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }
}

/// Body decoding strategy
pub trait BodyDecoder {
    /// Decode `body`, declared as `content_type`, into `T`
    ///
    /// # Errors
    ///
    /// Implementation-defined; returned to the handler unchanged.
    fn decode<T: DeserializeOwned>(&self, content_type: Option<&str>, body: &Bytes) -> Result<T>;
}

/// JSON (including `+json` media types) and plain text
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl BodyDecoder for DefaultDecoder {
    fn decode<T: DeserializeOwned>(&self, content_type: Option<&str>, body: &Bytes) -> Result<T> {
        let Some(content_type) = content_type else {
            return Err(Error::UnsupportedMediaType {
                content_type: String::new(),
            });
        };

        if is_json_media_type(content_type) {
            let mut buf = body.to_vec();
            return parse_json_bytes(&mut buf);
        }

        if is_text_media_type(content_type) {
            let text = std::str::from_utf8(body).map_err(|e| Error::BodyDecode {
                content_type: content_type.to_string(),
                reason: e.to_string(),
            })?;
            return serde_json::from_value(serde_json::Value::String(text.to_string())).map_err(
                |e| Error::BodyDecode {
                    content_type: content_type.to_string(),
                    reason: e.to_string(),
                },
            );
        }

        Err(Error::UnsupportedMediaType {
            content_type: content_type.to_string(),
        })
    }
}

fn is_text_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case("text/plain")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractField, ContractFields};
    use crate::param::{NestedParam, QueryParam};
    use crate::request::RawRequest;
    use serde::Deserialize;

    struct Search {
        page: QueryParam<u32>,
        tags: QueryParam<Vec<String>>,
        owner: NestedParam<String>,
        trace: HeaderParam<String>,
        retries: HeaderParam<i64>,
    }

    impl ContractFields for Search {
        fn fields(&self) -> Vec<ContractField<'_>> {
            vec![
                (&self.page).into(),
                (&self.tags).into(),
                (&self.owner).into(),
                (&self.trace).into(),
                (&self.retries).into(),
            ]
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Filter {
        term: String,
    }

    impl RouteContract for Search {
        type RequestBody = Filter;

        fn default_content_type(&self) -> Option<&str> {
            Some("application/json")
        }
    }

    fn contract() -> Arc<Contract<Search>> {
        Contract::new(Search {
            page: QueryParam::new("page").default_value(1),
            tags: QueryParam::new("tags"),
            owner: NestedParam::new(["filter", "owner"]),
            trace: HeaderParam::new("x-trace-id"),
            retries: HeaderParam::new("x-retries").default_value(0),
        })
    }

    fn typed(uri: &str, headers: &[(&str, &str)], body: Option<&str>) -> TypedRequest<Search> {
        let headers = headers
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let raw = RawRequest::new(Method::Post, uri, headers, body.map(|b| Bytes::from(b.to_string())));
        TypedRequest::new(contract(), raw.buffer_blocking(1024).unwrap())
    }

    #[test]
    fn test_query_defaults() {
        let req = typed("/search?page=abc", &[], None);
        let contract = req.contract();
        assert_eq!(req.query().get(&contract.page), Some(1));
        assert_eq!(req.query().get(&contract.tags), None);

        let req = typed("/search?page=3&page=9&tags=a,b", &[], None);
        let contract = req.contract();
        assert_eq!(req.query().get(&contract.page), Some(3));
        assert_eq!(
            req.query().get(&contract.tags),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_nested_query_param() {
        let req = typed("/search?filter%5Bowner%5D=ada&owner=bob", &[], None);
        assert_eq!(
            req.query().get(&req.contract().owner).as_deref(),
            Some("ada")
        );
    }

    #[test]
    fn test_url_decoding() {
        let req = typed("/search?tags=New+York,S%C3%A3o%20Paulo", &[], None);
        assert_eq!(
            req.query().get(&req.contract().tags),
            Some(vec!["New York".to_string(), "São Paulo".to_string()])
        );
    }

    #[test]
    fn test_headers_do_not_interfere() {
        let req = typed("/", &[("x-trace-id", "abc")], None);
        let contract = req.contract();
        assert_eq!(req.headers().get(&contract.trace).as_deref(), Some("abc"));
        assert_eq!(req.headers().get(&contract.retries), Some(0));

        let req = typed("/", &[("x-retries", "3")], None);
        let contract = req.contract();
        assert_eq!(req.headers().get(&contract.trace), None);
        assert_eq!(req.headers().get(&contract.retries), Some(3));

        let req = typed("/", &[("x-retries", "three"), ("x-trace-id", "t")], None);
        let contract = req.contract();
        assert_eq!(req.headers().get(&contract.retries), Some(0));
        assert_eq!(req.headers().get(&contract.trace).as_deref(), Some("t"));
    }

    #[test]
    fn test_decode_body_uses_default_content_type() {
        let mut req = typed("/", &[], Some(r#"{"term":"rust"}"#));
        assert_eq!(req.head().content_type(), None);
        let filter = req.decode_body().unwrap();
        assert_eq!(filter.term, "rust");
        assert_eq!(req.head().content_type(), Some("application/json"));
    }

    #[test]
    fn test_decode_body_propagates_errors() {
        let mut req = typed("/", &[], Some("{not json"));
        assert!(matches!(req.decode_body(), Err(Error::BodyDecode { .. })));

        let mut req = typed("/", &[("content-type", "application/xml")], Some("<a/>"));
        assert!(matches!(
            req.decode_body(),
            Err(Error::UnsupportedMediaType { .. })
        ));
    }

    #[test]
    fn test_text_decoder() {
        let decoded: String = DefaultDecoder
            .decode(Some("text/plain; charset=utf-8"), &Bytes::from("hi"))
            .unwrap();
        assert_eq!(decoded, "hi");

        let err = DefaultDecoder
            .decode::<String>(None, &Bytes::from("hi"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType { .. }));
    }

    struct Reject;

    impl BodyDecoder for Reject {
        fn decode<T: DeserializeOwned>(&self, content_type: Option<&str>, _: &Bytes) -> Result<T> {
            Err(Error::UnsupportedMediaType {
                content_type: content_type.unwrap_or_default().to_string(),
            })
        }
    }

    #[test]
    fn test_explicit_decoder() {
        let mut req = typed("/", &[], Some(r#"{"term":"rust"}"#));
        let err = req.decode_body_with(&Reject).unwrap_err();
        assert!(err.to_string().contains("application/json"));
    }

    #[test]
    fn test_path_params() {
        let mut raw = RawRequest::new(Method::Get, "/users/42", HashMap::new(), None);
        raw.head_mut().set_path_params(HashMap::from([
            ("id".to_string(), "42".to_string()),
            ("slug".to_string(), "x".to_string()),
        ]));
        let req = TypedRequest::new(contract(), raw.buffer_blocking(0).unwrap());
        assert_eq!(req.path_param::<i64>("id"), Some(42));
        assert_eq!(req.path_param::<i64>("slug"), None);
        assert_eq!(req.path_param::<String>("missing"), None);
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.path(), "/users/42");
    }
}
