//! # JSON Serialization Module
//!
//! JSON decoding with simd-json, encoding with serde_json.
//!
//! Request bodies are decoded through [`parse_json_bytes`], response bodies
//! wrapped in [`crate::body::Json`] are encoded through [`to_json`].

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Media type for JSON bodies
pub const APPLICATION_JSON: &str = "application/json";

/// Parse JSON string to a typed value using simd-json
///
/// # Errors
///
/// Returns `Error::BodyDecode` if parsing fails
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> Result<T> {
    let mut bytes = json_str.as_bytes().to_vec();
    parse_json_bytes(&mut bytes)
}

/// Parse JSON bytes to a typed value using simd-json
///
/// simd-json parses in place, so the buffer is clobbered.
///
/// # Errors
///
/// Returns `Error::BodyDecode` if parsing fails
pub fn parse_json_bytes<T: DeserializeOwned>(bytes: &mut [u8]) -> Result<T> {
    simd_json::from_slice(bytes).map_err(|e| Error::BodyDecode {
        content_type: APPLICATION_JSON.to_string(),
        reason: e.to_string(),
    })
}

/// Serialize a value to a JSON string
///
/// # Errors
///
/// Returns `Error::Json` if the value cannot be represented as JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serialize a value to pretty-printed JSON string
///
/// # Errors
///
/// Returns `Error::Json` if the value cannot be represented as JSON
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Whether a content type selects the JSON decoder
///
/// Accepts `application/json` and any `+json` structured suffix,
/// ignoring parameters such as `charset`.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == APPLICATION_JSON || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        age: i32,
    }

    #[test]
    fn test_parse_json_object() {
        let json = r#"{"name": "John", "age": 30}"#;
        let data: TestData = parse_json(json).unwrap();
        assert_eq!(data.name, "John");
        assert_eq!(data.age, 30);
    }

    #[test]
    fn test_parse_json_map() {
        let json = r#"{"key": "value", "count": "42"}"#;
        let map: HashMap<String, String> = parse_json(json).unwrap();
        assert_eq!(map.get("key"), Some(&"value".to_string()));
    }

    #[test]
    fn test_parse_json_bytes() {
        let mut bytes = r#"{"name": "Jane", "age": 25}"#.as_bytes().to_vec();
        let data: TestData = parse_json_bytes(&mut bytes).unwrap();
        assert_eq!(data.name, "Jane");
    }

    #[test]
    fn test_to_json() {
        let data = TestData {
            name: "Bob".to_string(),
            age: 40,
        };
        let json = to_json(&data).unwrap();
        assert!(json.contains("Bob"));
        assert!(json.contains("40"));
    }

    #[test]
    fn test_invalid_json() {
        let result: Result<TestData> = parse_json("not valid json");
        assert!(matches!(result, Err(Error::BodyDecode { .. })));
    }

    #[test]
    fn test_json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
    }
}
