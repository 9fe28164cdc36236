mod link;
mod observability;
mod store;

pub use link::*;
pub use observability::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Read a TOML config file.  A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.store.path.as_os_str().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "store.path".into(),
                message: "path must not be empty".into(),
            });
        }

        let reconnect = &self.link.reconnect;
        if reconnect.initial_delay_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "link.reconnect.initial_delay_ms".into(),
                message: "initial delay must be greater than 0".into(),
            });
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "link.reconnect.max_delay_ms".into(),
                message: "max delay must not be lower than the initial delay".into(),
            });
        }
        if reconnect.backoff_factor < 1.0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "link.reconnect.backoff_factor".into(),
                message: "backoff factor must be at least 1.0".into(),
            });
        }

        // Absorbed read failures are invisible without this.
        if !self.link.observe_errors {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "link.observe_errors".into(),
                message: "unreadable session records will be dropped silently".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let errors = Config::default().validate();
        assert!(errors
            .iter()
            .all(|e| e.severity != ConfigSeverity::Error));
    }

    #[test]
    fn inverted_delays_are_rejected() {
        let mut config = Config::default();
        config.link.reconnect.initial_delay_ms = 5_000;
        config.link.reconnect.max_delay_ms = 1_000;
        let errors = config.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "link.reconnect.max_delay_ms"));
    }

    #[test]
    fn display_includes_tag_and_field() {
        let err = ConfigError {
            severity: ConfigSeverity::Warning,
            field: "link.observe_errors".into(),
            message: "x".into(),
        };
        assert_eq!(err.to_string(), "[WARN] link.observe_errors: x");
    }
}
