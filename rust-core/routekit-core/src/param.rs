//! # Parameter Descriptors
//!
//! Declarative description of one named input of a route: a query
//! parameter, a header, or a nested (`filter[name]`-style) query parameter.
//!
//! Descriptors are immutable once built and are meant to live inside a
//! shared route contract. Allowed-value lists are documentation only: no
//! accessor checks an incoming value against them.

use crate::coerce::{ParamValue, SemanticType};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Where a parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Query string entry
    Query,
    /// Request header
    Header,
    /// Nested query string entry (`a[b][c]`)
    Nested,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Header => f.write_str("header"),
            Self::Nested => f.write_str("nested"),
        }
    }
}

impl ParamKind {
    /// Key under which a parameter with `path` is looked up
    #[must_use]
    pub fn lookup_key(self, path: &[String]) -> Cow<'_, str> {
        match self {
            Self::Query => Query::lookup_key(path),
            Self::Header => Header::lookup_key(path),
            Self::Nested => Nested::lookup_key(path),
        }
    }

    /// Whether the value comes from the query string
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::Query | Self::Nested)
    }
}

/// Source marker for a [`Param`]
pub trait Source: Send + Sync + 'static {
    /// The kind reported in documentation
    const KIND: ParamKind;

    /// Key under which the raw value is looked up
    fn lookup_key(path: &[String]) -> Cow<'_, str> {
        Cow::Borrowed(&path[0])
    }
}

/// Query string source marker
#[derive(Debug, Clone, Copy)]
pub struct Query;

/// Header source marker
#[derive(Debug, Clone, Copy)]
pub struct Header;

/// Nested query string source marker
#[derive(Debug, Clone, Copy)]
pub struct Nested;

impl Source for Query {
    const KIND: ParamKind = ParamKind::Query;
}

impl Source for Header {
    const KIND: ParamKind = ParamKind::Header;
}

impl Source for Nested {
    const KIND: ParamKind = ParamKind::Nested;

    fn lookup_key(path: &[String]) -> Cow<'_, str> {
        let (first, rest) = path.split_first().map_or(("", &[][..]), |(f, r)| (f.as_str(), r));
        let mut key = first.to_string();
        for segment in rest {
            key.push('[');
            key.push_str(segment);
            key.push(']');
        }
        Cow::Owned(key)
    }
}

/// Sources that live in the query string
pub trait QuerySource: Source {}

impl QuerySource for Query {}
impl QuerySource for Nested {}

/// A typed parameter descriptor
///
/// Use the aliases [`QueryParam`], [`HeaderParam`] and [`NestedParam`].
pub struct Param<S: Source, T: ParamValue> {
    path: Vec<String>,
    allowed_values: Option<Vec<String>>,
    description: Option<String>,
    default: Option<T>,
    required: bool,
    deprecated: bool,
    _source: PhantomData<fn() -> S>,
}

/// Query string parameter
pub type QueryParam<T> = Param<Query, T>;
/// Header parameter
pub type HeaderParam<T> = Param<Header, T>;
/// Nested query string parameter
pub type NestedParam<T> = Param<Nested, T>;

impl<S: Source, T: ParamValue> Param<S, T> {
    fn from_path(path: Vec<String>) -> Self {
        assert!(
            !path.is_empty(),
            "{} parameter descriptor needs a non-empty path",
            S::KIND
        );
        assert!(
            !path[0].is_empty(),
            "{} parameter descriptor needs a non-empty name",
            S::KIND
        );
        Self {
            path,
            allowed_values: None,
            description: None,
            default: None,
            required: false,
            deprecated: false,
            _source: PhantomData,
        }
    }

    /// Restrict the documented value set
    ///
    /// Values are stored in their rendered string form. They are not
    /// checked against request values.
    #[must_use]
    pub fn allowed(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.allowed_values = Some(values.into_iter().map(|v| v.render()).collect());
        self
    }

    /// Attach a human-readable description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Value returned when the parameter is absent or malformed
    #[must_use]
    pub fn default_value(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// Parameter name (first path segment for nested parameters)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.path[0]
    }

    /// Full path; a single segment for query and header parameters
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Raw lookup key in the request
    #[must_use]
    pub fn key(&self) -> Cow<'_, str> {
        S::lookup_key(&self.path)
    }

    /// Declared default
    #[must_use]
    pub const fn declared_default(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// Documented allowed values
    #[must_use]
    pub fn allowed_values(&self) -> Option<&[String]> {
        self.allowed_values.as_deref()
    }

    /// Coerce a raw value, falling back to the default when it is absent or
    /// malformed
    #[must_use]
    pub fn resolve(&self, raw: Option<&str>) -> Option<T> {
        let Some(raw) = raw else {
            return self.default.clone();
        };
        match T::from_raw(raw) {
            Some(value) => Some(value),
            None => {
                tracing::debug!(
                    kind = %S::KIND,
                    name = %self.key(),
                    raw = %raw,
                    semantic_type = %T::semantic_type(),
                    "Parameter coercion failed, using default"
                );
                self.default.clone()
            }
        }
    }
}

impl<T: ParamValue> Param<Query, T> {
    /// Unconstrained query parameter
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_path(vec![name.into()])
    }

    /// Query parameter with a documented allowed-value list
    #[must_use]
    pub fn constrained(name: impl Into<String>, allowed: impl IntoIterator<Item = T>) -> Self {
        Self::new(name).allowed(allowed)
    }
}

impl<T: ParamValue> Param<Header, T> {
    /// Unconstrained header parameter
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_path(vec![name.into()])
    }

    /// Header parameter with a documented allowed-value list
    #[must_use]
    pub fn constrained(name: impl Into<String>, allowed: impl IntoIterator<Item = T>) -> Self {
        Self::new(name).allowed(allowed)
    }
}

impl<T: ParamValue> Param<Nested, T> {
    /// Nested query parameter addressed by `path`
    ///
    /// # Panics
    ///
    /// Panics if `path` is empty or its first segment is empty.
    #[must_use]
    pub fn new<I, P>(path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::from_path(path.into_iter().map(Into::into).collect())
    }

    /// Nested parameter with a documented allowed-value list
    #[must_use]
    pub fn constrained<I, P>(path: I, allowed: impl IntoIterator<Item = T>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::new(path).allowed(allowed)
    }
}

impl<S: QuerySource, T: ParamValue> Param<S, T> {
    /// Mark the parameter as required (documentation only)
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the parameter as deprecated (documentation only)
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

impl<S: Source, T: ParamValue + fmt::Debug> fmt::Debug for Param<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("kind", &S::KIND)
            .field("path", &self.path)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Type-erased documentation view of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    /// Source kind
    pub kind: ParamKind,
    /// Parameter name
    pub name: String,
    /// Full path (nested parameters)
    pub path: Vec<String>,
    /// Target type
    pub semantic_type: SemanticType,
    /// Documented allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Required flag
    pub required: bool,
    /// Deprecated flag
    pub deprecated: bool,
}

/// Capability of presenting parameter metadata
pub trait ParamDescriptor: Send + Sync {
    /// Documentation view
    fn info(&self) -> ParamInfo;
}

impl<S: Source, T: ParamValue> ParamDescriptor for Param<S, T> {
    fn info(&self) -> ParamInfo {
        ParamInfo {
            kind: S::KIND,
            name: self.name().to_string(),
            path: self.path.clone(),
            semantic_type: T::semantic_type(),
            allowed_values: self.allowed_values.clone(),
            description: self.description.clone(),
            default_value: self.default.as_ref().map(ParamValue::render),
            required: self.required,
            deprecated: self.deprecated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::ScalarType;

    #[test]
    fn test_query_param_metadata() {
        let param = QueryParam::<i64>::new("page")
            .description("Page number")
            .default_value(1)
            .required()
            .deprecated();
        let info = param.info();

        assert_eq!(info.kind, ParamKind::Query);
        assert_eq!(info.name, "page");
        assert_eq!(info.semantic_type, SemanticType::Scalar(ScalarType::Int));
        assert_eq!(info.default_value.as_deref(), Some("1"));
        assert_eq!(info.description.as_deref(), Some("Page number"));
        assert!(info.required);
        assert!(info.deprecated);
        assert!(info.allowed_values.is_none());
    }

    #[test]
    fn test_constrained_values_are_rendered() {
        let param = QueryParam::<i32>::constrained("limit", [10, 50, 100]);
        assert_eq!(
            param.allowed_values(),
            Some(&["10".to_string(), "50".to_string(), "100".to_string()][..])
        );
    }

    #[test]
    fn test_allowed_values_are_not_enforced() {
        let param = QueryParam::<String>::constrained("sort", ["asc".to_string()]);
        assert_eq!(param.resolve(Some("random")), Some("random".to_string()));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let param = QueryParam::<i64>::new("echo").default_value(7);
        assert_eq!(param.resolve(None), Some(7));
        assert_eq!(param.resolve(Some("a21f")), Some(7));
        assert_eq!(param.resolve(Some("10")), Some(10));

        let bare = QueryParam::<i64>::new("echo");
        assert_eq!(bare.resolve(Some("a21f")), None);
    }

    #[test]
    fn test_list_param_resolution() {
        let param = QueryParam::<Vec<String>>::new("tags");
        assert_eq!(
            param.resolve(Some("hello,world")),
            Some(vec!["hello".to_string(), "world".to_string()])
        );
        assert_eq!(param.resolve(Some("")), Some(vec![String::new()]));

        let numbers = QueryParam::<Vec<i32>>::new("ids").default_value(vec![0]);
        assert_eq!(numbers.resolve(Some("1,oops")), Some(vec![0]));
    }

    #[test]
    fn test_nested_key() {
        let param = NestedParam::<String>::new(["filter", "owner", "name"]);
        assert_eq!(param.name(), "filter");
        assert_eq!(param.key(), "filter[owner][name]");
        assert_eq!(param.info().kind, ParamKind::Nested);
    }

    #[test]
    fn test_header_key_is_name() {
        let param = HeaderParam::<u32>::new("x-retry-count");
        assert_eq!(param.key(), "x-retry-count");
        assert!(!param.info().required);
    }

    #[test]
    #[should_panic(expected = "non-empty path")]
    fn test_nested_empty_path_panics() {
        let _ = NestedParam::<String>::new(Vec::<String>::new());
    }

    #[test]
    #[should_panic(expected = "non-empty name")]
    fn test_empty_name_panics() {
        let _ = QueryParam::<String>::new("");
    }
}
