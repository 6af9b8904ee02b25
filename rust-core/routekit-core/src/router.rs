//! # High-Performance Router
//!
//! Radix-trie based router using `matchit` for route matching.
//!
//! ## Features
//!
//! - Path parameter extraction (`/users/{id}`)
//! - Typed parameter declarations (`/users/{id:int}`) kept as metadata
//! - Single-segment wildcards (`/files/*`) and catch-alls (`/files/{*rest}`)
//!
//! The router matches and extracts raw strings only; typed reads happen in
//! the request facade.

use crate::error::{Error, Result};
use crate::path::RoutePath;
use crate::route::RouteInfo;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

impl Method {
    /// Map a hyper method; `None` for methods the router does not serve
    #[must_use]
    pub fn from_hyper(method: &hyper::Method) -> Option<Self> {
        Some(match *method {
            hyper::Method::GET => Self::Get,
            hyper::Method::POST => Self::Post,
            hyper::Method::PUT => Self::Put,
            hyper::Method::DELETE => Self::Delete,
            hyper::Method::PATCH => Self::Patch,
            hyper::Method::HEAD => Self::Head,
            hyper::Method::OPTIONS => Self::Options,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// Route handler identifier
pub type HandlerId = usize;

/// Opaque handle to a registered route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle {
    method: Method,
    handler_id: HandlerId,
}

impl RouteHandle {
    /// Method the route was registered for
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Handler identifier
    #[must_use]
    pub const fn handler_id(&self) -> HandlerId {
        self.handler_id
    }
}

/// Matched route with extracted raw path parameters
#[derive(Debug)]
pub struct Match<'a> {
    /// The handler ID for this route
    pub handler_id: HandlerId,
    /// Raw extracted path parameters
    pub params: HashMap<String, String>,
    /// The matched route
    pub route: &'a RouteInfo,
}

/// High-performance HTTP router using radix trie
#[derive(Clone, Default)]
pub struct Router {
    /// Per-method routers for efficient matching
    method_routes: HashMap<Method, MatchitRouter<HandlerId>>,
    /// Route metadata indexed by handler ID
    routes: Vec<RouteInfo>,
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route with the given method and path
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the pattern is malformed or
    /// conflicts with an existing route
    pub fn add_route(&mut self, method: Method, path: RoutePath) -> Result<RouteHandle> {
        let handler_id = self.routes.len();
        let route_info = RouteInfo::new(handler_id, method, path);

        self.method_routes
            .entry(method)
            .or_insert_with(MatchitRouter::new)
            .insert(route_info.match_pattern.clone(), handler_id)
            .map_err(|e| Error::InvalidRoutePattern {
                pattern: route_info.path.to_string(),
                reason: e.to_string(),
            })?;

        self.routes.push(route_info);

        Ok(RouteHandle { method, handler_id })
    }

    /// Match a request path against registered routes
    ///
    /// # Errors
    ///
    /// Returns `Error::RouteNotFound` if no matching route exists
    pub fn match_route(&self, method: Method, path: &str) -> Result<Match<'_>> {
        let not_found = || Error::RouteNotFound {
            path: path.to_string(),
        };

        let matched = self
            .method_routes
            .get(&method)
            .ok_or_else(not_found)?
            .at(path)
            .map_err(|_| not_found())?;

        let handler_id = *matched.value;
        let route = self.routes.get(handler_id).ok_or_else(not_found)?;

        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Ok(Match {
            handler_id,
            params,
            route,
        })
    }

    /// Route registered under `handle`
    #[must_use]
    pub fn route(&self, handle: RouteHandle) -> Option<&RouteInfo> {
        self.routes.get(handle.handler_id)
    }

    /// Mutable route registered under `handle`
    pub fn route_mut(&mut self, handle: RouteHandle) -> Option<&mut RouteInfo> {
        self.routes.get_mut(handle.handler_id)
    }

    /// All registered routes in registration order
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }
}
