use async_trait::async_trait;
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Connectivity and timeout failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Connection(_) | BackendError::Timeout(_))
    }
}

/// A remote key-value service holding plain string values.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// (Re)establishes the connection. Calling it while connected replaces the connection.
    async fn connect(&self) -> Result<(), BackendError>;

    async fn disconnect(&self) -> Result<(), BackendError>;

    fn is_connected(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Stores `value` under `key`. With a `ttl` the backend expires the key on its own.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BackendError::Connection("refused".into()).is_transient());
        assert!(BackendError::Timeout("read".into()).is_transient());
        assert!(!BackendError::Auth("bad password".into()).is_transient());
        assert!(!BackendError::Protocol("unexpected reply".into()).is_transient());
        assert!(!BackendError::Other("oops".into()).is_transient());
    }
}
