//! Values stored under key records.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use kh_store::Buffer;

/// A key value as handed to (and received from) the protocol layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// Reconstructed app-state sync key.
    AppStateSyncKey(AppStateSyncKeyData),
    /// Any other category, kept as decoded JSON (buffers stay tagged).
    Raw(Value),
}

impl KeyValue {
    /// `null` carries no key and is treated like a missing value.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Raw(Value::Null))
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Self::Raw(v) => Some(v),
            Self::AppStateSyncKey(_) => None,
        }
    }

    pub fn as_app_state_sync_key(&self) -> Option<&AppStateSyncKeyData> {
        match self {
            Self::AppStateSyncKey(k) => Some(k),
            Self::Raw(_) => None,
        }
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

impl From<AppStateSyncKeyData> for KeyValue {
    fn from(value: AppStateSyncKeyData) -> Self {
        Self::AppStateSyncKey(value)
    }
}

/// Key used to decrypt app-state sync patches.
///
/// Built the way the protocol's message types accept plain objects: every
/// field is optional, unknown fields are dropped, and a timestamp may
/// arrive as a number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppStateSyncKeyData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_data: Option<Buffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<AppStateSyncKeyFingerprint>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_i64"
    )]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppStateSyncKeyFingerprint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_indexes: Vec<u32>,
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {n}"))),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid timestamp: {s:?}"))),
        Some(other) => Err(de::Error::custom(format!("invalid timestamp: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_plain_object_and_drops_unknown_fields() {
        let raw = json!({
            "keyData": { "type": "Buffer", "data": [1, 2, 3] },
            "fingerprint": { "rawId": 9, "currentIndex": 1, "deviceIndexes": [0, 4] },
            "timestamp": "1700000000000",
            "leftover": true,
        });
        let data: AppStateSyncKeyData = serde_json::from_value(raw).unwrap();
        assert_eq!(data.key_data, Some(Buffer(vec![1, 2, 3])));
        assert_eq!(data.timestamp, Some(1_700_000_000_000));
        let fp = data.fingerprint.unwrap();
        assert_eq!(fp.raw_id, Some(9));
        assert_eq!(fp.device_indexes, vec![0, 4]);
    }

    #[test]
    fn missing_fields_default() {
        let data: AppStateSyncKeyData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(data, AppStateSyncKeyData::default());
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let data = AppStateSyncKeyData {
            key_data: Some(Buffer(vec![7])),
            fingerprint: None,
            timestamp: Some(5),
        };
        assert_eq!(
            serde_json::to_value(KeyValue::from(data)).unwrap(),
            json!({ "keyData": { "type": "Buffer", "data": [7] }, "timestamp": 5 })
        );
    }

    #[test]
    fn null_raw_value_is_absent() {
        assert!(KeyValue::Raw(Value::Null).is_absent());
        assert!(!KeyValue::Raw(json!(0)).is_absent());
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let raw = json!({ "timestamp": "yesterday" });
        assert!(serde_json::from_value::<AppStateSyncKeyData>(raw).is_err());
    }
}
