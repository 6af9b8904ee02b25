//! # Routekit Core
//!
//! Typed route contracts over a Hyper/Tokio host.
//!
//! A route contract declares, once, everything an endpoint accepts and
//! returns: query, header and nested query parameters with their types and
//! defaults, the possible response variants, and the request body type.
//! Handlers then read parameters through the contract's descriptors and
//! answer by naming one of its variants.
//!
//! ```ignore
//! #[derive(ContractFields)]
//! struct Hello {
//!     echo: QueryParam<i64>,
//!     success: ResponseVariant<String>,
//! }
//!
//! impl RouteContract for Hello {
//!     type RequestBody = ();
//! }
//!
//! let contract = Contract::new(Hello {
//!     echo: QueryParam::new("echo"),
//!     success: ResponseVariant::status(200),
//! });
//!
//! let mut routes = Routes::new();
//! routes.get("/hello", contract, |req: TypedRequest<Hello>| async move {
//!     let echo = req.query().get(&req.contract().echo);
//!     let body = echo.map_or_else(|| "Hello".to_string(), |e| e.to_string());
//!     req.respond(&req.contract().success).encode(body).await
//! })?;
//! ```
//!
//! ## Modules
//!
//! - `coerce` - Scalar and list coercion of raw strings
//! - `param` - Query, header and nested parameter descriptors
//! - `variant` - Response variants and their discovered metadata
//! - `body` - Response body encoding
//! - `contract` - Route contracts and the shared contract wrapper
//! - `registry` - Contract discovery and the route documentation index
//! - `request` - Host request with lazy, bounded body buffering
//! - `facade` - Typed request facade handed to handlers
//! - `builder` - Response encoder bound to a variant
//! - `bridge` - Blocking adapter for the async operations
//! - `path` - Route paths and typed path components
//! - `router` - High-performance routing using matchit (radix trie)
//! - `route` - Route metadata and information
//! - `routes` - Route registration adapter
//! - `response` - Host response value
//! - `server` - HTTP server built on Hyper
//! - `json` - High-performance JSON parsing with simd-json
//! - `telemetry` - Structured logging setup
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

extern crate self as routekit_core;

pub mod body;
pub mod bridge;
pub mod builder;
pub mod coerce;
pub mod contract;
pub mod error;
pub mod facade;
pub mod json;
pub mod param;
pub mod path;
pub mod registry;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod routes;
pub mod server;
pub mod telemetry;
pub mod variant;

pub use body::{BodyType, IntoBody, Json};
pub use builder::Encoder;
pub use coerce::{Coerce, ParamValue, ScalarType, SemanticType};
pub use contract::{Contract, ContractField, ContractFields, ContractShape, RouteContract};
pub use error::{Error, Result};
pub use facade::{BodyDecoder, DefaultDecoder, Headers, QueryParams, TypedRequest};
pub use json::{parse_json, to_json};
pub use param::{HeaderParam, NestedParam, ParamDescriptor, ParamInfo, ParamKind, QueryParam};
pub use path::{PathComponent, PathParamDoc, RoutePath};
pub use registry::{discover, ContractRegistry, RouteDoc};
pub use request::{BufferedRequest, RawRequest, RequestHead};
pub use response::Response;
pub use route::{RouteInfo, RouteMetadata};
pub use router::{Method, RouteHandle, Router};
pub use routekit_macros::ContractFields;
pub use routes::{blocking, Handler, IntoResponse, Routes};
pub use server::{Server, ServerConfig};
pub use telemetry::init_tracing;
pub use variant::{ResponseVariant, VariantDescriptor, VariantInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
