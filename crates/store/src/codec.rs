//! Text form of persisted records.
//!
//! Records are JSON.  Byte buffers, which JSON cannot carry natively, are
//! written as `{"type":"Buffer","data":[..]}` so they survive a round trip
//! through the `data` column untouched.  Rows may also carry `data` as a
//! base64 string; both forms decode to the same bytes.

use std::fmt;
use std::ops::Deref;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

const BUFFER_TAG: &str = "Buffer";

/// Serialize a record to its persisted text form.
///
/// Fails on a buffer object that [`decode`] would refuse, so nothing is
/// written that cannot be read back.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let text = serde_json::to_string(value)?;
    let written: Value = serde_json::from_str(&text)?;
    check_buffers(&written, &mut String::from("$"))?;
    Ok(text)
}

/// Parse a persisted record.
///
/// Buffer tags are checked even when `T` is a dynamic [`Value`], so a
/// corrupted buffer is caught here instead of deep inside the protocol layer.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    check_buffers(&value, &mut String::from("$"))?;
    Ok(serde_json::from_value(value)?)
}

fn check_buffers(value: &Value, path: &mut String) -> Result<(), CodecError> {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some(BUFFER_TAG) {
                if let Some(data) = map.get("data") {
                    if buffer_bytes(data).is_none() {
                        return Err(CodecError::MalformedBuffer { path: path.clone() });
                    }
                    return Ok(());
                }
            }
            for (key, child) in map {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                check_buffers(child, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                check_buffers(child, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Bytes of a buffer's `data`: an array of octets or a base64 string.
fn buffer_bytes(data: &Value) -> Option<Vec<u8>> {
    match data {
        Value::Array(items) => items
            .iter()
            .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        Value::String(encoded) => STANDARD.decode(encoded).ok(),
        _ => None,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Buffer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw bytes that serialize in the tagged buffer form.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Buffer(pub Vec<u8>);

impl Buffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({} bytes)", self.0.len())
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Buffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Buffer", 2)?;
        s.serialize_field("type", BUFFER_TAG)?;
        s.serialize_field("data", &self.0)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for Buffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "type")]
            kind: String,
            data: Value,
        }

        let tagged = Tagged::deserialize(deserializer)?;
        if tagged.kind != BUFFER_TAG {
            return Err(de::Error::custom(format!(
                "expected buffer tag, found {:?}",
                tagged.kind
            )));
        }
        buffer_bytes(&tagged.data)
            .map(Self)
            .ok_or_else(|| de::Error::custom("buffer data is neither octets nor base64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct KeyPair {
        public: Buffer,
        private: Buffer,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SignedKey {
        key_pair: KeyPair,
        signature: Buffer,
        key_id: u32,
        extra: Option<Vec<Buffer>>,
    }

    #[test]
    fn buffer_uses_tagged_form() {
        let text = encode(&Buffer(vec![1, 2, 255])).unwrap();
        assert_eq!(text, r#"{"type":"Buffer","data":[1,2,255]}"#);
    }

    #[test]
    fn nested_buffers_round_trip() {
        let key = SignedKey {
            key_pair: KeyPair {
                public: Buffer(vec![5; 33]),
                private: Buffer(vec![0, 128, 255]),
            },
            signature: Buffer(Vec::new()),
            key_id: 7,
            extra: Some(vec![Buffer(vec![9]), Buffer(vec![])]),
        };
        let decoded: SignedKey = decode(&encode(&key).unwrap()).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn dynamic_value_keeps_buffer_tags() {
        let value = json!({ "noiseKey": { "public": { "type": "Buffer", "data": [1, 2] } } });
        let decoded: Value = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn malformed_text_is_codec_error() {
        let err = decode::<Value>("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn out_of_range_byte_is_rejected() {
        let text = r#"{"a":[{"type":"Buffer","data":[1,256]}]}"#;
        match decode::<Value>(text) {
            Err(CodecError::MalformedBuffer { path }) => assert_eq!(path, "$.a[0]"),
            other => panic!("expected malformed buffer, got {other:?}"),
        }
    }

    #[test]
    fn base64_buffer_decodes_and_keeps_its_text_form() {
        let text = r#"{"noiseKey":{"private":{"type":"Buffer","data":"AQI="}}}"#;
        let value: Value = decode(text).unwrap();
        assert_eq!(value["noiseKey"]["private"]["data"], json!("AQI="));

        let buf: Buffer = decode(r#"{"type":"Buffer","data":"AQI="}"#).unwrap();
        assert_eq!(buf.as_bytes(), &[1, 2]);
    }

    #[test]
    fn base64_value_round_trips_through_encode() {
        let value = json!({ "k": { "type": "Buffer", "data": "AQI=" } });
        let decoded: Value = decode(&encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn encode_refuses_what_decode_would_refuse() {
        let value = json!({ "k": [{ "type": "Buffer", "data": "%%not base64%%" }] });
        match encode(&value) {
            Err(CodecError::MalformedBuffer { path }) => assert_eq!(path, "$.k[0]"),
            other => panic!("expected malformed buffer, got {other:?}"),
        }
        assert!(encode(&json!({ "type": "Buffer", "data": [1, 999] })).is_err());
    }

    #[test]
    fn wrong_tag_does_not_decode_as_buffer() {
        let text = r#"{"type":"Blob","data":[1]}"#;
        assert!(decode::<Buffer>(text).is_err());
    }
}
