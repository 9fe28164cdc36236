//! Categories of rotating key material.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kh_store::CodecError;

use crate::value::{AppStateSyncKeyData, KeyValue};

/// Every category of key the protocol layer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyCategory {
    PreKey,
    Session,
    SenderKey,
    SenderKeyMemory,
    AppStateSyncKey,
    AppStateSyncVersion,
    LidMapping,
    DeviceList,
    Tctoken,
}

impl KeyCategory {
    pub const ALL: [KeyCategory; 9] = [
        Self::PreKey,
        Self::Session,
        Self::SenderKey,
        Self::SenderKeyMemory,
        Self::AppStateSyncKey,
        Self::AppStateSyncVersion,
        Self::LidMapping,
        Self::DeviceList,
        Self::Tctoken,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreKey => "pre-key",
            Self::Session => "session",
            Self::SenderKey => "sender-key",
            Self::SenderKeyMemory => "sender-key-memory",
            Self::AppStateSyncKey => "app-state-sync-key",
            Self::AppStateSyncVersion => "app-state-sync-version",
            Self::LidMapping => "lid-mapping",
            Self::DeviceList => "device-list",
            Self::Tctoken => "tctoken",
        }
    }

    /// Whether decoded values must be rebuilt into a typed structure
    /// instead of being handed out as raw JSON.
    pub fn needs_reconstruction(self) -> bool {
        matches!(self, Self::AppStateSyncKey)
    }

    /// Logical record id of key `id` in this category.
    pub fn record_id(self, id: &str) -> String {
        format!("{}-{id}", self.as_str())
    }

    /// Turn a decoded record into the value handed to the protocol layer.
    pub fn reconstruct(self, raw: Value) -> Result<KeyValue, CodecError> {
        if self.needs_reconstruction() {
            let data: AppStateSyncKeyData = serde_json::from_value(raw)?;
            Ok(KeyValue::AppStateSyncKey(data))
        } else {
            Ok(KeyValue::Raw(raw))
        }
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unrecognized category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for KeyCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}
