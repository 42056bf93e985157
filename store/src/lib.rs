pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod memory;
pub mod metrics_defs;
pub mod redis_backend;
pub mod retry;

#[cfg(test)]
mod testutils;

use backend::{Backend, BackendError};
use config::{BackendConfig, Config};
use std::sync::Arc;
use std::time::Duration;

pub use client::{Store, StoreError};

pub fn get_backend(config: &Config) -> Result<Arc<dyn Backend>, BackendError> {
    match &config.backend {
        BackendConfig::Memory => {
            tracing::warn!("using the in-memory store backend, data is lost on restart");
            Ok(Arc::new(memory::MemoryBackend::new()))
        }
        BackendConfig::Redis {
            host,
            port,
            db,
            password,
        } => Ok(Arc::new(redis_backend::RedisBackend::new(
            host,
            *port,
            *db,
            password.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?)),
    }
}

/// Builds a store from config. The backend is not connected yet.
pub fn build_store(config: &Config) -> Result<Store, BackendError> {
    Ok(Store::new(get_backend(config)?, config))
}
