//! Bounded retry for backend calls.
//!
//! Connectivity failures sleep for `reconnect_delay`, reconnect and try again.
//! Timeouts retry straight away since the backend timeout already bounded the
//! wait. Any other error is returned on the first occurrence.

use crate::backend::BackendError;
use crate::metrics_defs::{STORE_RETRIES_EXHAUSTED, STORE_RETRY};
use shared::counter;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 5;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: BackendError },

    #[error(transparent)]
    Fatal(BackendError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub reconnect_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, reconnect_delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            reconnect_delay,
        }
    }

    /// Runs `call` until it succeeds, fails permanently, or the attempts run out.
    /// `reconnect` is invoked after the delay that follows each connectivity failure.
    pub async fn run<T, C, CFut, R, RFut>(
        &self,
        operation: &'static str,
        mut call: C,
        mut reconnect: R,
    ) -> Result<T, RetryError>
    where
        C: FnMut() -> CFut,
        CFut: Future<Output = Result<T, BackendError>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = Result<(), BackendError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation, attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => return Err(RetryError::Fatal(err)),
                Err(err) => err,
            };

            if attempt >= self.attempts {
                counter!(STORE_RETRIES_EXHAUSTED, "operation" => operation).increment(1);
                tracing::error!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "giving up on '{operation}' operation"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            counter!(STORE_RETRY, "operation" => operation).increment(1);

            match &err {
                BackendError::Timeout(_) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %err,
                        "timeout in '{operation}' operation, retrying"
                    );
                }
                _ => {
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %err,
                        "connection error in '{operation}' operation, trying to reconnect"
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                    if let Err(reconnect_err) = reconnect().await {
                        tracing::warn!(operation, error = %reconnect_err, "reconnect failed");
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_ATTEMPTS, Duration::from_secs(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_secs(3))
    }

    async fn no_reconnect() -> Result<(), BackendError> {
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let reconnects = &AtomicU32::new(0);

        let result = policy()
            .run(
                "get",
                move || async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 | 1 => Err(BackendError::Connection("refused".into())),
                        2 => Err(BackendError::Timeout("read".into())),
                        _ => Ok("value"),
                    }
                },
                move || async move {
                    reconnects.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
            .await;

        assert_eq!(result, Ok("value"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Timeouts do not trigger a reconnect.
        assert_eq!(reconnects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exactly_n_attempts() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = policy()
            .run(
                "set",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(BackendError::Connection("refused".into()))
                },
                no_reconnect,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 5,
                last: BackendError::Connection("refused".into()),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_only_on_connection_errors() {
        let start = tokio::time::Instant::now();

        let _: Result<(), _> = policy()
            .run(
                "get",
                || async { Err(BackendError::Timeout("read".into())) },
                no_reconnect,
            )
            .await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        let _: Result<(), _> = policy()
            .run(
                "get",
                || async { Err(BackendError::Connection("reset".into())) },
                no_reconnect,
            )
            .await;
        // Four sleeps between five attempts, none after the final one.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(12), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(15), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = policy()
            .run(
                "get",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(BackendError::Auth("WRONGPASS".into()))
                },
                no_reconnect,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result,
            Err(RetryError::Fatal(BackendError::Auth("WRONGPASS".into())))
        );
    }

    #[test]
    fn test_attempts_never_zero() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
    }
}
