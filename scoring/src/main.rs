mod config;
mod telemetry;

use clap::Parser;
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use telemetry::TelemetryError;

#[derive(Parser, Debug)]
#[command(about = "Scoring API server")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overrides the listener port from the config
    #[arg(long, short, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Writes logs to this file instead of stderr
    #[arg(long)]
    log: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not create store: {0}")]
    Store(#[from] store::backend::BackendError),
    #[error("server failed: {0}")]
    Api(#[from] api::errors::ApiError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config.api.listener.port = port;
    }

    // Sentry must be initialized before the runtime starts.
    let _sentry_guard =
        telemetry::init_logging(&cli.log_level, cli.log.as_deref(), config.sentry_dsn())?;
    if let Some(metrics_config) = &config.common.metrics {
        telemetry::init_metrics(metrics_config)?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config.api))
}

async fn serve(config: api::config::Config) -> Result<(), CliError> {
    let store = Arc::new(store::build_store(&config.store)?);
    if let Err(err) = store.connect().await {
        tracing::error!(error = %err, "store is unreachable, will reconnect on first use");
    }

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        "starting scoring api"
    );

    let result = tokio::select! {
        result = api::run(config, store.clone()) => result.map_err(CliError::from),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    };

    if let Err(err) = store.disconnect().await {
        tracing::warn!(error = %err, "failed to disconnect from store");
    }
    result
}
