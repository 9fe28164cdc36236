use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Durable store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file holding the `session` table.
    #[serde(default = "d_path")]
    pub path: PathBuf,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "d_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: d_path(),
            busy_timeout_ms: d_busy_timeout_ms(),
        }
    }
}

fn d_path() -> PathBuf {
    PathBuf::from("keyhold.db")
}

fn d_busy_timeout_ms() -> u64 {
    5_000
}
