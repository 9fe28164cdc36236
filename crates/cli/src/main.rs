use clap::Parser;
use tracing_subscriber::EnvFilter;

use kh_cli::cli::{self, Cli, Command, ConfigCommand};
use kh_domain::config::{LogFormat, ObservabilityConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init => cli::init::init(),
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _config_path) = cli::load_config()?;
            cli::config::show(&config)
        }
        Command::Creds { session } => {
            let (config, _) = cli::load_config()?;
            init_tracing(&config.observability);
            let store = cli::open_store(&config)?;
            cli::session::creds(&store, &session).await
        }
        Command::Purge { session } => {
            let (config, _) = cli::load_config()?;
            init_tracing(&config.observability);
            let store = cli::open_store(&config)?;
            cli::session::purge(store, &session).await
        }
        Command::Version => {
            println!("keyhold {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize tracing on stderr so command output on stdout stays clean.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kh_link=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match obs.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.compact().init(),
    }
}
