//! # Route Paths
//!
//! A route path is an ordered list of components: constant segments, typed
//! parameters, single-segment wildcards and a trailing catch-all.
//!
//! Only typed parameters carry metadata. `typed` and `describe` are accepted
//! on every component and silently ignored by the others, so paths can be
//! built fluently without matching on the variant first.
//!
//! Paths parse from patterns such as `/users/{id:int}/files/{*rest}`; `*`
//! is an anonymous single-segment wildcard.

use crate::coerce::{ScalarType, SemanticType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One segment of a route path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// Literal segment
    Constant(String),
    /// Named, typed parameter
    Param {
        /// Parameter name
        name: String,
        /// Target type
        semantic_type: SemanticType,
        /// Description for documentation
        description: Option<String>,
    },
    /// Any single segment
    Wildcard,
    /// The remainder of the path
    CatchAll(String),
}

impl PathComponent {
    /// Literal segment
    #[must_use]
    pub fn constant(segment: impl Into<String>) -> Self {
        Self::Constant(segment.into())
    }

    /// String-typed parameter
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param {
            name: name.into(),
            semantic_type: SemanticType::default(),
            description: None,
        }
    }

    /// Any single segment
    #[must_use]
    pub const fn wildcard() -> Self {
        Self::Wildcard
    }

    /// Named remainder of the path
    #[must_use]
    pub fn catch_all(name: impl Into<String>) -> Self {
        Self::CatchAll(name.into())
    }

    /// Set the parameter type; no-op on other components
    #[must_use]
    pub fn typed(mut self, ty: impl Into<SemanticType>) -> Self {
        if let Self::Param { semantic_type, .. } = &mut self {
            *semantic_type = ty.into();
        }
        self
    }

    /// Set the parameter description; no-op on other components
    #[must_use]
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        if let Self::Param { description, .. } = &mut self {
            *description = Some(text.into());
        }
        self
    }

    /// Documentation entry for typed parameters
    #[must_use]
    pub fn doc(&self) -> Option<(&str, PathParamDoc)> {
        match self {
            Self::Param {
                name,
                semantic_type,
                description,
            } => Some((
                name.as_str(),
                PathParamDoc {
                    semantic_type: *semantic_type,
                    description: description.clone(),
                },
            )),
            _ => None,
        }
    }

    /// Parse a pattern segment
    ///
    /// Examples:
    /// - `users` -> `Constant("users")`
    /// - `{id}` -> string parameter `id`
    /// - `{id:int}` -> int parameter `id`
    /// - `*` -> `Wildcard`
    /// - `{*rest}` -> `CatchAll("rest")`
    fn parse_segment(segment: &str) -> Option<Self> {
        if segment == "*" {
            return Some(Self::Wildcard);
        }
        let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            return Some(Self::constant(segment));
        };
        if let Some(rest) = inner.strip_prefix('*') {
            return (!rest.is_empty()).then(|| Self::catch_all(rest));
        }
        let (name, spec) = match inner.split_once(':') {
            Some((name, spec)) => (name, Some(spec)),
            None => (inner, None),
        };
        if name.is_empty() {
            return None;
        }
        let component = Self::param(name);
        Some(match spec {
            Some(spec) => component.typed(parse_type_spec(spec)),
            None => component,
        })
    }
}

/// `int` -> scalar, `[int]` -> list
fn parse_type_spec(spec: &str) -> SemanticType {
    match spec.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => SemanticType::List(ScalarType::from_specifier(inner)),
        None => SemanticType::Scalar(ScalarType::from_specifier(spec)),
    }
}

/// Documentation attached to a typed path parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParamDoc {
    /// Target type
    pub semantic_type: SemanticType,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ordered list of path components
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePath {
    components: Vec<PathComponent>,
}

impl RoutePath {
    /// Build from components
    #[must_use]
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    /// Parse a pattern like `/users/{id:int}`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` for empty parameter names.
    pub fn parse(pattern: &str) -> Result<Self> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                PathComponent::parse_segment(segment).ok_or_else(|| Error::InvalidRoutePattern {
                    pattern: pattern.to_string(),
                    reason: format!("invalid segment '{segment}'"),
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Append a component
    #[must_use]
    pub fn push(mut self, component: PathComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Components in order
    #[must_use]
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Documentation of every typed parameter
    pub fn param_docs(&self) -> impl Iterator<Item = (&str, PathParamDoc)> {
        self.components.iter().filter_map(PathComponent::doc)
    }

    /// Pattern understood by matchit (`/users/{id}`)
    ///
    /// Anonymous wildcards become hidden `{__wildcardN}` parameters.
    #[must_use]
    pub fn match_pattern(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }
        let mut wildcards = 0;
        let mut pattern = String::new();
        for component in &self.components {
            pattern.push('/');
            match component {
                PathComponent::Constant(s) => pattern.push_str(s),
                PathComponent::Param { name, .. } => {
                    pattern.push('{');
                    pattern.push_str(name);
                    pattern.push('}');
                }
                PathComponent::Wildcard => {
                    pattern.push_str(&format!("{{__wildcard{wildcards}}}"));
                    wildcards += 1;
                }
                PathComponent::CatchAll(name) => {
                    pattern.push_str("{*");
                    pattern.push_str(name);
                    pattern.push('}');
                }
            }
        }
        pattern
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            f.write_str("/")?;
            match component {
                PathComponent::Constant(s) => f.write_str(s)?,
                PathComponent::Param {
                    name,
                    semantic_type: SemanticType::Scalar(ScalarType::String),
                    ..
                } => write!(f, "{{{name}}}")?,
                PathComponent::Param {
                    name,
                    semantic_type: SemanticType::Scalar(s),
                    ..
                } => write!(f, "{{{name}:{s}}}")?,
                PathComponent::Param {
                    name,
                    semantic_type: SemanticType::List(s),
                    ..
                } => write!(f, "{{{name}:[{s}]}}")?,
                PathComponent::Wildcard => f.write_str("*")?,
                PathComponent::CatchAll(name) => write!(f, "{{*{name}}}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for RoutePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Vec<PathComponent>> for RoutePath {
    fn from(components: Vec<PathComponent>) -> Self {
        Self::new(components)
    }
}

/// Anything a route can be registered under
pub trait IntoRoutePath {
    /// Convert into a [`RoutePath`]
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` for malformed patterns.
    fn into_route_path(self) -> Result<RoutePath>;
}

impl IntoRoutePath for RoutePath {
    fn into_route_path(self) -> Result<RoutePath> {
        Ok(self)
    }
}

impl IntoRoutePath for Vec<PathComponent> {
    fn into_route_path(self) -> Result<RoutePath> {
        Ok(RoutePath::new(self))
    }
}

impl IntoRoutePath for &str {
    fn into_route_path(self) -> Result<RoutePath> {
        RoutePath::parse(self)
    }
}

impl IntoRoutePath for String {
    fn into_route_path(self) -> Result<RoutePath> {
        RoutePath::parse(&self)
    }
}
