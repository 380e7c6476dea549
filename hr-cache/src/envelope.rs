use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The uniform cache envelope — `source`, `cached_at`, and `ttl_seconds` are
/// first-class rather than reconstructed from surrounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    pub data: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub source: String,
}

impl CacheEnvelope {
    pub fn new(data: serde_json::Value, ttl_seconds: u64, source: impl Into<String>) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            ttl_seconds,
            source: source.into(),
        }
    }
}

/// An empty list, empty object, or JSON null must never be served as a hit —
/// a previous write of an empty result must not masquerade as real data.
pub fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_empty() {
        assert!(is_empty_value(&serde_json::Value::Null));
    }

    #[test]
    fn empty_array_is_empty() {
        assert!(is_empty_value(&serde_json::json!([])));
    }

    #[test]
    fn empty_object_is_empty() {
        assert!(is_empty_value(&serde_json::json!({})));
    }

    #[test]
    fn non_empty_array_is_not_empty() {
        assert!(!is_empty_value(&serde_json::json!([1, 2])));
    }

    #[test]
    fn scalar_is_not_empty() {
        assert!(!is_empty_value(&serde_json::json!(42)));
        assert!(!is_empty_value(&serde_json::json!("x")));
    }
}
