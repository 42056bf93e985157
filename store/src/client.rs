use crate::backend::{Backend, BackendError};
use crate::cache::InProcessCache;
use crate::config::{CacheConfig, Config};
use crate::metrics_defs::{CACHE_HIT, CACHE_MISS};
use crate::retry::{RetryError, RetryPolicy};
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("could not get value after {attempts} attempts: {source}")]
    Get {
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("could not set value after {attempts} attempts: {source}")]
    Set {
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

enum Cache {
    InProcess(InProcessCache),
    Backend { prefix: String },
}

/// Key-value access with bounded retries for persistent data and a
/// best-effort TTL cache namespace.
pub struct Store {
    backend: Arc<dyn Backend>,
    retry: RetryPolicy,
    cache: Cache,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let cache = match &config.cache {
            CacheConfig::InProcess => Cache::InProcess(InProcessCache::new()),
            CacheConfig::Backend { prefix } => Cache::Backend {
                prefix: prefix.clone(),
            },
        };

        Store {
            backend,
            retry: RetryPolicy::new(config.attempts, Duration::from_secs(config.timeout_secs)),
            cache,
        }
    }

    pub async fn connect(&self) -> Result<(), StoreError> {
        self.backend.connect().await?;
        tracing::info!(backend = self.backend.name(), "connected to store backend");
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), StoreError> {
        self.backend.disconnect().await?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_connected()
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.retry
            .run("get", || self.backend.get(key), || self.backend.connect())
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { attempts, last } => StoreError::Get {
                    attempts,
                    source: last,
                },
                RetryError::Fatal(err) => StoreError::Backend(err),
            })
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.retry
            .run(
                "set",
                || self.backend.set(key, value, None),
                || self.backend.connect(),
            )
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { attempts, last } => StoreError::Set {
                    attempts,
                    source: last,
                },
                RetryError::Fatal(err) => StoreError::Backend(err),
            })
    }

    /// Returns the cached value unless it is missing or expired. Backend failures count as a miss.
    pub async fn cache_get(&self, key: &str) -> Option<String> {
        let value = match &self.cache {
            Cache::InProcess(cache) => cache.get(key),
            Cache::Backend { prefix } => {
                match self.backend.get(&format!("{prefix}{key}")).await {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::warn!(key, error = %err, "cache read failed");
                        None
                    }
                }
            }
        };

        let metric_def = if value.is_some() { CACHE_HIT } else { CACHE_MISS };
        counter!(metric_def).increment(1);
        value
    }

    pub async fn cache_set(&self, key: &str, value: &str, ttl: Duration) {
        match &self.cache {
            Cache::InProcess(cache) => cache.set(key, value, ttl),
            Cache::Backend { prefix } => {
                let key = format!("{prefix}{key}");
                if let Err(err) = self.backend.set(&key, value, Some(ttl)).await {
                    tracing::warn!(key = %key, error = %err, "cache write failed");
                }
            }
        }
    }
}
