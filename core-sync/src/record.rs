//! Payload model and metadata side-channel handling.
//!
//! Payloads written by the host may carry two reserved provenance fields:
//! a local-origin last-modified marker and a cloud-origin upload marker.
//! Both are bookkeeping, not data — they are stripped before any equality
//! comparison and before a value is copied into the other store, so
//! provenance never counts as a data difference.

use serde_json::Value;

/// Reserved field recording when the local side last modified a payload
/// (epoch milliseconds).
pub const LOCAL_TIMESTAMP_FIELD: &str = "_lastModified";

/// Reserved field recording when a payload was uploaded to the cloud store
/// (epoch milliseconds).
pub const CLOUD_TIMESTAMP_FIELD: &str = "_uploadedAt";

/// One side's view of a synchronized key.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    pub key: String,
    pub payload: Value,
    pub local_timestamp: Option<i64>,
    pub cloud_timestamp: Option<i64>,
}

impl SyncRecord {
    /// Build a record from a raw stored payload, extracting both reserved
    /// timestamp markers if present.
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        let local_timestamp = timestamp_field(&payload, LOCAL_TIMESTAMP_FIELD);
        let cloud_timestamp = timestamp_field(&payload, CLOUD_TIMESTAMP_FIELD);
        Self {
            key: key.into(),
            payload,
            local_timestamp,
            cloud_timestamp,
        }
    }

    /// The payload with both reserved markers removed; this is what gets
    /// compared and what gets written to the opposite store.
    pub fn stripped_payload(&self) -> Value {
        strip_metadata(&self.payload)
    }
}

/// Return an owned copy of `value` with the reserved metadata fields removed.
///
/// Only top-level object fields are reserved; nested occurrences are user
/// data and survive. Non-object payloads are returned unchanged.
pub fn strip_metadata(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut stripped = map.clone();
            stripped.remove(LOCAL_TIMESTAMP_FIELD);
            stripped.remove(CLOUD_TIMESTAMP_FIELD);
            Value::Object(stripped)
        }
        other => other.clone(),
    }
}

/// Structural equality after metadata stripping.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    strip_metadata(a) == strip_metadata(b)
}

fn timestamp_field(value: &Value, field: &str) -> Option<i64> {
    let marker = value.get(field)?;
    marker
        .as_i64()
        .or_else(|| marker.as_f64().map(|ts| ts as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_removes_reserved_fields() {
        let payload = json!({
            "score": 10,
            "_lastModified": 2000,
            "_uploadedAt": 1000,
        });
        assert_eq!(strip_metadata(&payload), json!({ "score": 10 }));
    }

    #[test]
    fn test_strip_keeps_nested_occurrences() {
        let payload = json!({
            "profile": { "_lastModified": 42 },
            "_lastModified": 2000,
        });
        assert_eq!(
            strip_metadata(&payload),
            json!({ "profile": { "_lastModified": 42 } })
        );
    }

    #[test]
    fn test_strip_passes_scalars_through() {
        assert_eq!(strip_metadata(&json!(7)), json!(7));
        assert_eq!(strip_metadata(&json!("high score")), json!("high score"));
        assert_eq!(strip_metadata(&Value::Null), Value::Null);
    }

    #[test]
    fn test_metadata_invariance() {
        // Same data, different provenance markers on each side.
        let local = json!({ "score": 10, "_lastModified": 2000 });
        let cloud = json!({ "score": 10, "_uploadedAt": 9999 });
        assert!(values_equal(&local, &cloud));

        let divergent = json!({ "score": 5, "_uploadedAt": 9999 });
        assert!(!values_equal(&local, &divergent));
    }

    #[test]
    fn test_record_extracts_timestamps() {
        let record = SyncRecord::new(
            "playerData",
            json!({ "score": 10, "_lastModified": 2000, "_uploadedAt": 1500.5 }),
        );
        assert_eq!(record.local_timestamp, Some(2000));
        assert_eq!(record.cloud_timestamp, Some(1500));
        assert_eq!(record.stripped_payload(), json!({ "score": 10 }));
    }

    #[test]
    fn test_record_without_markers() {
        let record = SyncRecord::new("settings", json!({ "volume": 0.8 }));
        assert_eq!(record.local_timestamp, None);
        assert_eq!(record.cloud_timestamp, None);
    }
}
