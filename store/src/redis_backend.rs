use crate::backend::{Backend, BackendError};
use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

impl From<redis::RedisError> for BackendError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            BackendError::Connection(err.to_string())
        } else if err.kind() == redis::ErrorKind::AuthenticationFailed {
            BackendError::Auth(err.to_string())
        } else if err.kind() == redis::ErrorKind::TypeError {
            BackendError::Protocol(err.to_string())
        } else {
            BackendError::Other(err.to_string())
        }
    }
}

/// Redis over a multiplexed tokio connection. Every command is bounded by `timeout`.
pub struct RedisBackend {
    client: redis::Client,
    timeout: Duration,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisBackend {
    pub fn new(
        host: &str,
        port: u16,
        db: i64,
        password: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let url = match password {
            Some(password) => format!("redis://:{password}@{host}:{port}/{db}"),
            None => format!("redis://{host}:{port}/{db}"),
        };
        let client = redis::Client::open(url).map_err(|e| BackendError::Other(e.to_string()))?;

        Ok(RedisBackend {
            client,
            timeout,
            connection: RwLock::new(None),
        })
    }

    fn connection(&self) -> Result<MultiplexedConnection, BackendError> {
        self.connection
            .read()
            .clone()
            .ok_or_else(|| BackendError::Connection("not connected to redis".into()))
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        timeout(self.timeout, fut)
            .await
            .map_err(|_| BackendError::Timeout(format!("no reply within {:?}", self.timeout)))?
            .map_err(BackendError::from)
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<(), BackendError> {
        let connection = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        *self.connection.write() = Some(connection);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BackendError> {
        // Dropping the last handle closes the multiplexed connection.
        self.connection.write().take();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut connection = self.connection()?;
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.bounded(cmd.query_async(&mut connection)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), BackendError> {
        let mut connection = self.connection()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            // Redis rejects a zero expiry.
            cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
        }
        self.bounded::<(), _>(cmd.query_async(&mut connection)).await
    }
}
