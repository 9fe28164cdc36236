pub mod config;
pub mod init;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use kh_domain::config::Config;
use kh_store::{SessionStore, SqliteExecutor};

/// Keyhold: durable session state for protocol clients.
#[derive(Debug, Parser)]
#[command(name = "keyhold", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a default config and create the session table.
    Init,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print the stored credentials of a session.
    Creds {
        /// Session identifier.
        session: String,
    },
    /// Delete every stored record of a session.
    Purge {
        /// Session identifier.
        session: String,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `KH_CONFIG` (or
/// `keyhold.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
pub fn load_config() -> anyhow::Result<(Config, PathBuf)> {
    let config_path: PathBuf = std::env::var_os("KH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(init::CONFIG_FILE));

    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    Ok((config, config_path))
}

/// Open the SQLite-backed store named by `[store]`.
pub fn open_store(config: &Config) -> anyhow::Result<SessionStore> {
    let exec = SqliteExecutor::open(
        &config.store.path,
        Duration::from_millis(config.store.busy_timeout_ms),
    )
    .with_context(|| format!("opening {}", config.store.path.display()))?;
    tracing::debug!(path = %config.store.path.display(), "session store opened");
    Ok(SessionStore::new(Arc::new(exec)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() {
        let cli = Cli::try_parse_from(["keyhold", "creds", "support-line"]).unwrap();
        assert!(matches!(cli.command, Command::Creds { session } if session == "support-line"));

        let cli = Cli::try_parse_from(["keyhold", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Validate)));
    }

    #[test]
    fn purge_requires_a_session() {
        assert!(Cli::try_parse_from(["keyhold", "purge"]).is_err());
    }
}
