//! # Route Contracts
//!
//! A route contract is the declared shape of one endpoint: its parameter
//! descriptors, its response variants, the type its request body decodes
//! to and the content type assumed when a request does not name one.
//!
//! Contracts are plain structs listing their descriptors as fields. The
//! field list is registered explicitly through [`ContractFields`], usually
//! derived:
//!
//! ```ignore
//! #[derive(ContractFields)]
//! struct Hello {
//!     echo: QueryParam<i64>,
//!     success: ResponseVariant<String>,
//!     bad_request: ResponseVariant<()>,
//! }
//!
//! impl RouteContract for Hello {
//!     type RequestBody = ();
//! }
//! ```
//!
//! [`Contract`] wraps one instance for sharing across requests and caches
//! everything discovery derives from it.

use crate::body::IntoBody;
use crate::coerce::ParamValue;
use crate::param::{Param, ParamDescriptor, ParamInfo, ParamKind, Source};
use crate::registry::{discover, Discovery};
use crate::variant::{ResponseVariant, VariantDescriptor, VariantInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

/// One registered field of a contract
#[derive(Clone, Copy)]
pub enum ContractField<'a> {
    /// A parameter descriptor
    Param(&'a dyn ParamDescriptor),
    /// A response variant
    Variant(&'a dyn VariantDescriptor),
}

impl<'a, S: Source, T: ParamValue> From<&'a Param<S, T>> for ContractField<'a> {
    fn from(param: &'a Param<S, T>) -> Self {
        Self::Param(param)
    }
}

impl<'a, T: IntoBody> From<&'a ResponseVariant<T>> for ContractField<'a> {
    fn from(variant: &'a ResponseVariant<T>) -> Self {
        Self::Variant(variant)
    }
}

/// Explicit registration of a contract's descriptor fields
pub trait ContractFields {
    /// Every parameter and response variant the contract declares
    fn fields(&self) -> Vec<ContractField<'_>>;
}

/// The declared shape of one endpoint
pub trait RouteContract: ContractFields + Send + Sync + 'static {
    /// Type the request body decodes to
    type RequestBody: DeserializeOwned + Send + 'static;

    /// Content type assumed when the request does not declare one
    fn default_content_type(&self) -> Option<&str> {
        None
    }

    /// Contract name used in logs and documentation
    fn name(&self) -> &str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Everything derived from a contract's declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractShape {
    /// Contract name
    pub name: String,
    /// Rust type name of the request body
    pub request_body_type: &'static str,
    /// Fallback content type for decoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_content_type: Option<String>,
    /// Query and nested query parameters
    pub request_query_params: Vec<ParamInfo>,
    /// Header parameters
    pub request_headers: Vec<ParamInfo>,
    /// `(status, content type, body type)` of every response variant
    pub response_variants: Vec<VariantInfo>,
}

/// Shared, immutable contract instance
///
/// Built once per route definition; discovery runs on construction.
#[derive(Debug)]
pub struct Contract<C: RouteContract> {
    inner: C,
    shape: ContractShape,
}

impl<C: RouteContract> Contract<C> {
    /// Wrap and inspect a contract
    ///
    /// # Panics
    ///
    /// Panics if two parameters of the same kind share a name.
    pub fn new(inner: C) -> Arc<Self> {
        let Discovery { params, variants } = discover(&inner);
        let (request_headers, request_query_params): (Vec<_>, Vec<_>) = params
            .into_iter()
            .partition(|p| p.kind == ParamKind::Header);

        let shape = ContractShape {
            name: inner.name().to_string(),
            request_body_type: type_name::<C::RequestBody>(),
            default_content_type: inner.default_content_type().map(str::to_string),
            request_query_params,
            request_headers,
            response_variants: variants,
        };

        debug!(
            contract = %shape.name,
            query_params = shape.request_query_params.len(),
            headers = shape.request_headers.len(),
            variants = shape.response_variants.len(),
            "Contract discovered"
        );

        Arc::new(Self { inner, shape })
    }

    /// Derived shape
    #[must_use]
    pub const fn shape(&self) -> &ContractShape {
        &self.shape
    }

    /// Rust type name of the request body
    #[must_use]
    pub const fn request_body_type(&self) -> &'static str {
        self.shape.request_body_type
    }

    /// Fallback content type for decoding
    #[must_use]
    pub fn default_content_type(&self) -> Option<&str> {
        self.shape.default_content_type.as_deref()
    }

    /// Query-kind parameter descriptors
    #[must_use]
    pub fn request_query_params(&self) -> &[ParamInfo] {
        &self.shape.request_query_params
    }

    /// Header parameter descriptors
    #[must_use]
    pub fn request_headers(&self) -> &[ParamInfo] {
        &self.shape.request_headers
    }

    /// Metadata of every response variant
    #[must_use]
    pub fn response_variants(&self) -> &[VariantInfo] {
        &self.shape.response_variants
    }
}

impl<C: RouteContract> Deref for Contract<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}
