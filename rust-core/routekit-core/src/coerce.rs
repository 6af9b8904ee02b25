//! # Scalar Coercion
//!
//! Conversion of raw query/header/path strings into typed values.
//!
//! Coercion never fails loudly: an unparseable value yields `None`, and the
//! caller decides what absence means (usually: fall back to a default).
//!
//! ## Lists
//!
//! List values are split on a literal comma with no trimming. An empty input
//! splits into a single empty element, so `""` coerces to `vec![""]` for
//! strings and fails for every numeric type. A list coerces only if every
//! element does.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar types a parameter can coerce to
///
/// Default is `String` so untyped path segments stay untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Integer type
    Int,
    /// Floating-point type
    Float,
    /// Boolean type - parses "true"/"false", "1"/"0", "yes"/"no"
    Bool,
}

impl ScalarType {
    /// Parse type specifier from route pattern (e.g., "int" from "{id:int}")
    #[must_use]
    pub fn from_specifier(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "int" | "integer" | "i64" => Self::Int,
            "float" | "f64" | "number" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            _ => Self::String,
        }
    }

    /// Get the type name for documentation
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Target type of a parameter: one scalar, or a comma-separated list of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "lowercase")]
pub enum SemanticType {
    /// A single scalar value
    Scalar(ScalarType),
    /// A comma-separated list of scalar values
    List(ScalarType),
}

impl Default for SemanticType {
    fn default() -> Self {
        Self::Scalar(ScalarType::String)
    }
}

impl From<ScalarType> for SemanticType {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::List(s) => write!(f, "[{s}]"),
        }
    }
}

/// A scalar that can be read from a raw string
pub trait Coerce: Sized {
    /// The scalar tag reported for documentation
    const SCALAR: ScalarType;

    /// Parse `raw`, returning `None` if it is not a valid literal
    fn coerce(raw: &str) -> Option<Self>;
}

impl Coerce for String {
    const SCALAR: ScalarType = ScalarType::String;

    fn coerce(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl Coerce for bool {
    const SCALAR: ScalarType = ScalarType::Bool;

    fn coerce(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }
}

macro_rules! coerce_from_str {
    ($scalar:expr => $($ty:ty),+) => {
        $(
            impl Coerce for $ty {
                const SCALAR: ScalarType = $scalar;

                fn coerce(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )+
    };
}

coerce_from_str!(ScalarType::Int => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
coerce_from_str!(ScalarType::Float => f32, f64);

/// Split a raw list value on literal commas
///
/// No trimming is applied and `""` yields `[""]`.
#[must_use]
pub fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',').collect()
}

/// Coerce every element of a comma-separated list
///
/// Returns `None` if any single element fails to coerce.
#[must_use]
pub fn coerce_list<T: Coerce>(raw: &str) -> Option<Vec<T>> {
    split_list(raw).into_iter().map(T::coerce).collect()
}

/// Value type carried by a parameter descriptor
///
/// Implemented for every [`Coerce`] scalar and for `Vec` of one.
pub trait ParamValue: Clone + Send + Sync + 'static {
    /// Semantic type tag used for documentation and discovery
    fn semantic_type() -> SemanticType;

    /// Coerce a raw string into this type
    fn from_raw(raw: &str) -> Option<Self>;

    /// Render the value the way it would appear on the wire
    fn render(&self) -> String;
}

macro_rules! scalar_param_value {
    ($($ty:ty),+) => {
        $(
            impl ParamValue for $ty {
                fn semantic_type() -> SemanticType {
                    SemanticType::Scalar(<$ty as Coerce>::SCALAR)
                }

                fn from_raw(raw: &str) -> Option<Self> {
                    <$ty as Coerce>::coerce(raw)
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )+
    };
}

scalar_param_value!(String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T> ParamValue for Vec<T>
where
    T: ParamValue + Coerce,
{
    fn semantic_type() -> SemanticType {
        SemanticType::List(T::SCALAR)
    }

    fn from_raw(raw: &str) -> Option<Self> {
        coerce_list(raw)
    }

    fn render(&self) -> String {
        self.iter().map(ParamValue::render).collect::<Vec<_>>().join(",")
    }
}
