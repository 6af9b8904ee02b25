//! # Route Registration
//!
//! Binds `(method, path, contract, handler)` into the router. The stored
//! endpoint buffers the request body (bounded by the table's maximum body
//! size, and only if the transport has not already done so), wraps the
//! request in a [`TypedRequest`] for the route's contract, and runs the
//! handler.
//!
//! Handlers come in two shapes:
//!
//! - async closures `Fn(TypedRequest<C>) -> impl Future<Output = impl IntoResponse>`
//! - blocking closures wrapped with [`blocking`], run on Tokio's blocking
//!   pool
//!
//! Registration also records each typed path parameter on the route's
//! metadata bag and adds the route to the contract registry. Neither
//! affects dispatch.

use crate::contract::{Contract, RouteContract};
use crate::error::{Error, Result};
use crate::facade::TypedRequest;
use crate::path::IntoRoutePath;
use crate::registry::{ContractRegistry, RouteDoc};
use crate::request::RawRequest;
use crate::response::Response;
use crate::router::{Match, Method, RouteHandle, Router};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error};

/// Default maximum request body size (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Values a handler may return
pub trait IntoResponse {
    /// Convert into the host response
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for Result<Response> {
    fn into_response(self) -> Response {
        self.unwrap_or_else(|err| error_response(&err))
    }
}

/// Generic failure response for an error that escaped a handler
#[must_use]
pub fn error_response(err: &Error) -> Response {
    Response::json(json!({ "error": err.to_string() }).to_string()).with_status(err.status_code())
}

/// Marker for async handlers
#[derive(Debug, Clone, Copy)]
pub struct AsyncHandler;

/// Marker for blocking handlers
#[derive(Debug, Clone, Copy)]
pub struct BlockingHandler;

/// A request handler for contract `C`
///
/// `M` only disambiguates the async and blocking implementations.
pub trait Handler<C: RouteContract, M>: Clone + Send + Sync + 'static {
    /// Handle one request
    fn call(&self, request: TypedRequest<C>) -> BoxFuture<Response>;
}

impl<C, F, Fut, R> Handler<C, AsyncHandler> for F
where
    C: RouteContract,
    F: Fn(TypedRequest<C>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, request: TypedRequest<C>) -> BoxFuture<Response> {
        let fut = self(request);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Blocking handler wrapper; see [`blocking`]
#[derive(Debug, Clone, Copy)]
pub struct Blocking<F>(F);

/// Run a synchronous handler on Tokio's blocking pool
///
/// Inside it, use the `_blocking` forms of body buffering and encoding.
pub const fn blocking<F>(handler: F) -> Blocking<F> {
    Blocking(handler)
}

impl<C, F, R> Handler<C, BlockingHandler> for Blocking<F>
where
    C: RouteContract,
    F: Fn(TypedRequest<C>) -> R + Clone + Send + Sync + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, request: TypedRequest<C>) -> BoxFuture<Response> {
        let handler = self.0.clone();
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || handler(request).into_response()).await {
                Ok(response) => response,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    error!(error = %err, "Blocking handler cancelled");
                    Response::text("Service Unavailable").with_status(503)
                }
            }
        })
    }
}

type Endpoint = Arc<dyn Fn(RawRequest, usize) -> BoxFuture<Response> + Send + Sync>;

/// Route table with typed contracts
pub struct Routes {
    router: Router,
    endpoints: Vec<Endpoint>,
    registry: ContractRegistry,
    max_body_size: usize,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
            registry: ContractRegistry::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl Routes {
    /// Empty table with the default body size limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum buffered body size
    ///
    /// A limit other than [`DEFAULT_MAX_BODY_SIZE`] takes precedence over
    /// `ServerConfig::max_body_size` when the table is handed to a server.
    #[must_use]
    pub const fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Set the maximum buffered body size in place
    pub fn set_max_body_size(&mut self, bytes: usize) {
        self.max_body_size = bytes;
    }

    /// Maximum buffered body size
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Register a handler for any method
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the path is malformed or
    /// conflicts with a route already registered for `method`.
    pub fn any<C, H, M>(
        &mut self,
        method: Method,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        let path = path.into_route_path()?;
        let handle = self.router.add_route(method, path)?;

        if let Some(route) = self.router.route_mut(handle) {
            route.record_path_params();
            self.registry.register(RouteDoc {
                method: method.to_string(),
                path: route.path.to_string(),
                path_params: route
                    .path
                    .param_docs()
                    .map(|(name, doc)| (name.to_string(), doc))
                    .collect(),
                contract: contract.shape().clone(),
            });
            debug!(
                method = %method,
                path = %route.path,
                contract = %contract.shape().name,
                "Route registered"
            );
        }

        let endpoint: Endpoint = Arc::new(move |raw: RawRequest, limit: usize| -> BoxFuture<Response> {
            let contract = Arc::clone(&contract);
            let handler = handler.clone();
            Box::pin(async move {
                match raw.buffer(limit).await {
                    Ok(request) => handler.call(TypedRequest::new(contract, request)).await,
                    Err(err) => error_response(&err),
                }
            })
        });
        self.endpoints.push(endpoint);

        Ok(handle)
    }

    /// Register a GET handler
    ///
    /// # Errors
    ///
    /// See [`Routes::any`].
    pub fn get<C, H, M>(
        &mut self,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        self.any(Method::Get, path, contract, handler)
    }

    /// Register a POST handler
    ///
    /// # Errors
    ///
    /// See [`Routes::any`].
    pub fn post<C, H, M>(
        &mut self,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        self.any(Method::Post, path, contract, handler)
    }

    /// Register a PUT handler
    ///
    /// # Errors
    ///
    /// See [`Routes::any`].
    pub fn put<C, H, M>(
        &mut self,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        self.any(Method::Put, path, contract, handler)
    }

    /// Register a PATCH handler
    ///
    /// # Errors
    ///
    /// See [`Routes::any`].
    pub fn patch<C, H, M>(
        &mut self,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        self.any(Method::Patch, path, contract, handler)
    }

    /// Register a DELETE handler
    ///
    /// # Errors
    ///
    /// See [`Routes::any`].
    pub fn delete<C, H, M>(
        &mut self,
        path: impl IntoRoutePath,
        contract: Arc<Contract<C>>,
        handler: H,
    ) -> Result<RouteHandle>
    where
        C: RouteContract,
        H: Handler<C, M>,
    {
        self.any(Method::Delete, path, contract, handler)
    }

    /// The underlying router
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Documentation of every registered route
    #[must_use]
    pub const fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Route a request to its endpoint and run it
    ///
    /// Unmatched requests get the generic 404 failure response.
    pub async fn dispatch(&self, mut raw: RawRequest) -> Response {
        let head = raw.head();
        let matched = match self.router.match_route(head.method, head.path()) {
            Ok(matched) => matched,
            Err(err) => return error_response(&err),
        };
        let Match {
            handler_id, params, ..
        } = matched;
        raw.head_mut().set_path_params(params);

        match self.endpoints.get(handler_id) {
            Some(endpoint) => endpoint(raw, self.max_body_size).await,
            None => error_response(&Error::RouteNotFound {
                path: raw.head().path().to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for Routes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routes")
            .field("routes", &self.router.routes().len())
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}
