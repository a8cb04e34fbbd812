use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use perfdash_cli::commands::{self, Cli};
use perfdash_cli::config::{CliConfig, LogFormat, DEFAULT_LOG_FILTER};

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = CliConfig::from_env()?;

    // --- Tracing ---
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
    tracing::debug!(?config, "Loaded configuration");

    let cli = Cli::parse();
    let clean = commands::run(cli.command, &config)?;
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
