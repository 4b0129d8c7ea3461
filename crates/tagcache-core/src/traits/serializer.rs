//! Serialization of typed values into cache strings

use crate::CacheError;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for converting typed values to and from the opaque strings the
/// cache stores
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Name of the serializer (for debugging/metrics)
    fn name(&self) -> &str;

    /// Serialize a value to a string
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError>;

    /// Deserialize a string to a value
    fn deserialize<T: DeserializeOwned>(&self, raw: &str) -> Result<T, CacheError>;
}

/// JSON serializer (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, CacheError> {
        serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, raw: &str) -> Result<T, CacheError> {
        serde_json::from_str(raw).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_struct() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Product {
            code: String,
            stock: i32,
        }

        let serializer = JsonSerializer;
        let value = Product {
            code: "demo-article".to_string(),
            stock: 42,
        };

        let raw = serializer.serialize(&value).unwrap();
        assert_eq!(raw, r#"{"code":"demo-article","stock":42}"#);

        let decoded: Product = serializer.deserialize(&raw).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_json_deserialize_garbage() {
        let err = JsonSerializer.deserialize::<Vec<i32>>("not json").unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[test]
    fn test_json_serializer_name() {
        assert_eq!(JsonSerializer.name(), "json");
    }
}
