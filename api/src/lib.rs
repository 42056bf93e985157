pub mod auth;
pub mod config;
pub mod errors;
pub mod fields;
pub mod method;
pub mod metrics_defs;
pub mod model;
pub mod requests;
pub mod scoring;
pub mod service;

use errors::ApiError;
use method::Dispatcher;
use service::ScoringService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use store::Store;

/// Serves method calls, and health checks when an admin listener is configured, until a listener fails.
pub async fn run(config: config::Config, store: Arc<Store>) -> Result<(), ApiError> {
    let scoring_service = ScoringService::new(Dispatcher::new(config.auth.clone()), store.clone());
    let scoring_task = run_http_service(&config.listener.host, config.listener.port, scoring_service);

    match &config.admin_listener {
        Some(admin_listener) => {
            let admin_service = AdminService::new(move || store.is_ready());
            let admin_task = run_http_service::<_, ApiError>(
                &admin_listener.host,
                admin_listener.port,
                admin_service,
            );
            tokio::try_join!(scoring_task, admin_task)?;
        }
        None => scoring_task.await?,
    }

    Ok(())
}
