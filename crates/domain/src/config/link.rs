use serde::{Deserialize, Serialize};

use crate::identity::{BrowserName, Level};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport link
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the orchestrator brings up and renews transport connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Browser advertised in the client identity.
    #[serde(default)]
    pub browser: BrowserName,

    /// Verbosity handed to the transport.
    #[serde(default)]
    pub log_level: Level,

    /// Report session records that could not be read back.
    #[serde(default = "d_true")]
    pub observe_errors: bool,

    /// Retry policy when a restart cycle fails to bootstrap.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            browser: BrowserName::default(),
            log_level: Level::default(),
            observe_errors: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "d_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "d_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "d_backoff_factor")]
    pub backoff_factor: f64,
    /// `0` means unlimited retries.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: d_initial_delay_ms(),
            max_delay_ms: d_max_delay_ms(),
            backoff_factor: d_backoff_factor(),
            max_attempts: 0,
        }
    }
}

fn d_true() -> bool {
    true
}

fn d_initial_delay_ms() -> u64 {
    1_000
}

fn d_max_delay_ms() -> u64 {
    60_000
}

fn d_backoff_factor() -> f64 {
    2.0
}
