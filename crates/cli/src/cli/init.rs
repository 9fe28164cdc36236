use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use kh_domain::config::Config;
use kh_store::SqliteExecutor;

pub const CONFIG_FILE: &str = "keyhold.toml";

/// Scaffold a Keyhold setup in the current directory.
pub fn init() -> anyhow::Result<()> {
    init_in(Path::new("."))
}

// ── Core implementation (directory-parameterised for testability) ─────

fn init_in(base: &Path) -> anyhow::Result<()> {
    let config_path = base.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{CONFIG_FILE} already exists. Use a different directory or remove it first.");
    }

    let config = Config::default();
    std::fs::write(&config_path, render_config(&config)?)?;

    // Opening the database creates the session table.
    let db_path = base.join(&config.store.path);
    SqliteExecutor::open(&db_path, Duration::from_millis(config.store.busy_timeout_ms))
        .with_context(|| format!("creating {}", db_path.display()))?;

    eprintln!();
    eprintln!("  Keyhold initialized!");
    eprintln!();
    eprintln!("  Created:");
    eprintln!("    {CONFIG_FILE}  - configuration");
    eprintln!("    {}   - session store", config.store.path.display());
    eprintln!();
    Ok(())
}

fn render_config(config: &Config) -> anyhow::Result<String> {
    Ok(format!(
        "# Keyhold configuration\n# Override the location with KH_CONFIG.\n\n{}",
        config.to_toml_string()?
    ))
}
