//! Long-lived authentication material for one session.
//!
//! The protocol layer owns the shape of the credentials; Keyhold only needs
//! to persist, replace and default-initialize them, so they are carried as
//! an opaque JSON document.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Credentials snapshot for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Value);

impl Credentials {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Fresh credentials for a session that has never been paired.
    ///
    /// Key material is generated by the protocol layer on first handshake,
    /// so only the bookkeeping fields are seeded here.
    pub fn initial() -> Self {
        Self(json!({
            "registered": false,
            "accountSyncCounter": 0,
            "processedHistoryMessages": [],
            "accountSettings": { "unarchiveChats": false },
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the protocol layer has completed pairing for these credentials.
    pub fn is_registered(&self) -> bool {
        self.0
            .get("registered")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::initial()
    }
}

impl From<Value> for Credentials {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_unregistered() {
        let creds = Credentials::initial();
        assert!(!creds.is_registered());
        assert_eq!(creds.get("accountSyncCounter"), Some(&json!(0)));
    }

    #[test]
    fn serializes_transparently() {
        let creds = Credentials::new(json!({ "token": "abc" }));
        assert_eq!(serde_json::to_string(&creds).unwrap(), r#"{"token":"abc"}"#);
    }

    #[test]
    fn registered_flag_is_read() {
        let creds = Credentials::new(json!({ "registered": true }));
        assert!(creds.is_registered());
    }
}
