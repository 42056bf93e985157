use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("could not open log file: {0}")]
    LogFile(#[from] std::io::Error),
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not install metrics recorder: {0}")]
    Metrics(String),
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Log lines go to `log_file` when given, stderr otherwise. The returned guard
/// flushes pending Sentry events when dropped.
pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
    sentry_dsn: Option<&str>,
) -> Result<Option<sentry::ClientInitGuard>, TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let sentry_guard = sentry_dsn.map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    let registry = tracing_subscriber::registry().with(filter).with(sentry_layer);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
        }
        None => registry.with(fmt::layer()).try_init()?,
    }

    Ok(sentry_guard)
}

pub fn init_metrics(config: &MetricsConfig) -> Result<(), TelemetryError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|err| TelemetryError::Metrics(err.to_string()))?;

    describe_all(api::metrics_defs::ALL_METRICS);
    describe_all(store::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "sending metrics to statsd"
    );
    Ok(())
}
