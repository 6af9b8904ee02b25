//! # Contract Discovery and Registry
//!
//! Discovery walks the explicit field list of a contract and sorts each
//! field by capability: parameter descriptors on one side, response
//! variants on the other. It is a pure scan; output follows declaration
//! order, which carries no priority meaning.
//!
//! The registry is the documentation index of every registered route.

use crate::contract::{ContractField, ContractFields, ContractShape};
use crate::param::{ParamInfo, ParamKind};
use crate::path::PathParamDoc;
use crate::variant::VariantInfo;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Fields of a contract sorted by capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Parameter descriptors
    pub params: Vec<ParamInfo>,
    /// Response variant metadata
    pub variants: Vec<VariantInfo>,
}

/// Enumerate and classify a contract's declared fields
///
/// # Panics
///
/// Panics if two parameters read the same request key: the same query
/// string key (plain or nested) or the same header name. A contract is
/// shared process-wide, so this is rejected at construction.
pub fn discover(contract: &dyn ContractFields) -> Discovery {
    let mut discovery = Discovery::default();
    let mut seen: HashSet<(bool, String)> = HashSet::new();

    for field in contract.fields() {
        match field {
            ContractField::Param(param) => {
                let info = param.info();
                let key = lookup_key(&info);
                assert!(
                    seen.insert((info.kind.is_query(), key.clone())),
                    "duplicate {} parameter '{}' in route contract",
                    info.kind,
                    key
                );
                discovery.params.push(info);
            }
            ContractField::Variant(variant) => discovery.variants.push(variant.info()),
        }
    }

    discovery
}

/// Header names compare case-insensitively
fn lookup_key(info: &ParamInfo) -> String {
    let key = info.kind.lookup_key(&info.path);
    match info.kind {
        ParamKind::Header => key.to_ascii_lowercase(),
        ParamKind::Query | ParamKind::Nested => key.into_owned(),
    }
}

/// Documentation of one registered route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDoc {
    /// HTTP method
    pub method: String,
    /// Declared path pattern
    pub path: String,
    /// Typed path parameters by name
    pub path_params: BTreeMap<String, PathParamDoc>,
    /// The bound contract's shape
    pub contract: ContractShape,
}

/// Index of every registered route and its contract
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    routes: Vec<RouteDoc>,
}

impl ContractRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route's documentation
    pub fn register(&mut self, doc: RouteDoc) {
        self.routes.push(doc);
    }

    /// Documentation of the route registered for `method` and `path`
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<&RouteDoc> {
        self.routes
            .iter()
            .find(|r| r.method.eq_ignore_ascii_case(method) && r.path == path)
    }

    /// All routes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RouteDoc> {
        self.routes.iter()
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Render the whole index as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails
    pub fn to_json(&self) -> crate::error::Result<String> {
        crate::json::to_json_pretty(self)
    }
}
