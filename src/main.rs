use anyhow::{Context, Result};
use career_admin::cli::{handle_command, Cli};
use career_admin::config::{AdminConfig, LoggingConfig};
use career_admin::lifetime::Lifetime;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AdminConfig::load(&cli.overrides())?;

    init_logging(&config.logging)?;
    if let Some((path, environment)) = &config.source {
        info!(
            "Loaded configuration for environment {} from {}",
            environment,
            path.display()
        );
    }

    // Ctrl-C ends every view and abandons in-flight requests
    let lifetime = Lifetime::new();
    let interrupt = lifetime.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    handle_command(cli, config, lifetime).await
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .context("Invalid log filter")?;

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Clear file on startup
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}
