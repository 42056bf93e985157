use crate::backend::{Backend, BackendError};
use crate::memory::MemoryBackend;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Wraps a memory backend and fails data calls with scripted errors before delegating.
pub struct FlakyBackend {
    inner: MemoryBackend,
    failures: Mutex<VecDeque<BackendError>>,
    pub calls: AtomicU32,
    pub connects: AtomicU32,
}

impl FlakyBackend {
    pub fn new(failures: impl IntoIterator<Item = BackendError>) -> Self {
        FlakyBackend {
            inner: MemoryBackend::new(),
            failures: Mutex::new(failures.into_iter().collect()),
            calls: AtomicU32::new(0),
            connects: AtomicU32::new(0),
        }
    }

    pub fn failing_with(err: BackendError, times: usize) -> Self {
        Self::new(std::iter::repeat_n(err, times))
    }

    /// Writes directly to the wrapped backend without consuming a scripted failure.
    pub async fn seed(&self, key: &str, value: &str) {
        self.inner.connect().await.expect("connect memory backend");
        self.inner
            .set(key, value, None)
            .await
            .expect("seed memory backend");
    }

    fn next_failure(&self) -> Option<BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.failures.lock().pop_front()
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn connect(&self) -> Result<(), BackendError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connect().await
    }

    async fn disconnect(&self) -> Result<(), BackendError> {
        self.inner.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match self.next_failure() {
            Some(err) => Err(err),
            None => self.inner.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), BackendError> {
        match self.next_failure() {
            Some(err) => Err(err),
            None => self.inner.set(key, value, ttl).await,
        }
    }
}
