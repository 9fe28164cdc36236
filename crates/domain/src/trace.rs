use serde::Serialize;

/// Structured trace events emitted across all Keyhold crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionBootstrapped {
        session_id: String,
        connection_id: String,
        generation: u64,
        creds_restored: bool,
    },
    CredsSaved {
        session_id: String,
    },
    KeyBatchApplied {
        session_id: String,
        written: usize,
        deleted: usize,
        failed: usize,
    },
    ReadAbsorbed {
        session_id: String,
        record_id: String,
        reason: String,
    },
    RestartCycle {
        session_id: String,
        generation: u64,
        at: chrono::DateTime<chrono::Utc>,
    },
    TransportOpFailed {
        session_id: String,
        operation: String,
        error: String,
    },
    SessionPurged {
        session_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "kh_event");
    }
}
