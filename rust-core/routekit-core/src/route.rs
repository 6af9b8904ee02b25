//! # Route Metadata
//!
//! Single-responsibility module for route information.
//!
//! Every registered route carries an out-of-band metadata bag. The
//! registration adapter stores one [`PathParamDoc`] per typed path
//! parameter in it, keyed by parameter name, for documentation tooling.
//! Nothing in dispatch reads the bag.

use crate::path::{PathParamDoc, RoutePath};
use crate::router::{HandlerId, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// String-keyed bag of JSON values attached to a route
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RouteMetadata {
    entries: BTreeMap<String, Value>,
}

impl RouteMetadata {
    /// Store a value, replacing any previous one under `key`
    ///
    /// Values that fail to serialize are stored as `null`.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.entries.insert(key.into(), value);
    }

    /// Raw value under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Value under `key` decoded as `T`
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Documentation of the typed path parameter `name`
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<PathParamDoc> {
        self.get_as(name)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Route metadata containing handler and path information
#[derive(Debug, Clone)]
pub struct RouteInfo {
    /// Unique handler identifier
    pub handler_id: HandlerId,
    /// HTTP method
    pub method: Method,
    /// Declared path
    pub path: RoutePath,
    /// Normalized path for matchit (e.g., "/users/{id}")
    pub match_pattern: String,
    /// Out-of-band metadata bag
    pub metadata: RouteMetadata,
}

impl RouteInfo {
    /// Create a new RouteInfo for a declared path
    #[must_use]
    pub fn new(handler_id: HandlerId, method: Method, path: RoutePath) -> Self {
        let match_pattern = path.match_pattern();
        Self {
            handler_id,
            method,
            path,
            match_pattern,
            metadata: RouteMetadata::default(),
        }
    }

    /// Record the documentation of every typed path parameter
    pub fn record_path_params(&mut self) {
        let docs: Vec<_> = self
            .path
            .param_docs()
            .map(|(name, doc)| (name.to_string(), doc))
            .collect();
        for (name, doc) in docs {
            self.metadata.insert(name, &doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{ScalarType, SemanticType};
    use crate::path::PathComponent;

    #[test]
    fn test_route_info_simple() {
        let info = RouteInfo::new(0, Method::Get, RoutePath::parse("/users").unwrap());
        assert_eq!(info.match_pattern, "/users");
        assert!(info.metadata.is_empty());
    }

    #[test]
    fn test_route_info_records_typed_params() {
        let path = RoutePath::new(vec![
            PathComponent::constant("users"),
            PathComponent::param("user_id")
                .typed(ScalarType::Int)
                .describe("User identifier"),
            PathComponent::Wildcard,
            PathComponent::catch_all("rest"),
        ]);
        let mut info = RouteInfo::new(3, Method::Get, path);
        info.record_path_params();

        assert_eq!(info.metadata.len(), 1);
        let doc = info.metadata.path_param("user_id").unwrap();
        assert_eq!(doc.semantic_type, SemanticType::Scalar(ScalarType::Int));
        assert_eq!(doc.description.as_deref(), Some("User identifier"));
        assert!(info.metadata.path_param("rest").is_none());
    }

    #[test]
    fn test_metadata_bag() {
        let mut bag = RouteMetadata::default();
        bag.insert("owner", &"team-a");
        assert_eq!(bag.get_as::<String>("owner").as_deref(), Some("team-a"));
        assert_eq!(bag.get_as::<u32>("owner"), None);
        assert_eq!(bag.iter().count(), 1);
    }
}
